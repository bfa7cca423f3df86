// ── Wizard state machine ──
//
// The five-stage setup flow as a pure reducer. Front-ends translate user
// input and backend results into `Event`s, render from the returned
// `Wizard`, and carry out the returned `Effect`s. Nothing here performs I/O.

use std::time::Duration;

use pcap2socks_api::StatusResponse;
use strum::{Display, EnumIter};

/// Latency above this many milliseconds is shown as unreachable.
pub const LATENCY_CEILING_MS: u64 = 1000;

// ── Stage ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter)]
pub enum Stage {
    #[default]
    Welcome,
    Interface,
    Device,
    Proxy,
    Running,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Self::Welcome,
        Self::Interface,
        Self::Device,
        Self::Proxy,
        Self::Running,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Welcome => 0,
            Self::Interface => 1,
            Self::Device => 2,
            Self::Proxy => 3,
            Self::Running => 4,
        }
    }

    /// The stage `Advance` moves to. Proxy and Running have none: Running is
    /// only reached through a successful run.
    fn next(self) -> Option<Self> {
        match self {
            Self::Welcome => Some(Self::Interface),
            Self::Interface => Some(Self::Device),
            Self::Device => Some(Self::Proxy),
            Self::Proxy | Self::Running => None,
        }
    }

    fn prev(self) -> Option<Self> {
        match self {
            Self::Interface => Some(Self::Welcome),
            Self::Device => Some(Self::Interface),
            Self::Proxy => Some(Self::Device),
            Self::Welcome | Self::Running => None,
        }
    }
}

// ── Telemetry ───────────────────────────────────────────────────────

/// Display-ready running statistics. Every field is NaN until the first
/// status report arrives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    /// Seconds since the engine reported running; one poll period per report.
    pub elapsed: f64,
    /// Milliseconds, or +∞ when above [`LATENCY_CEILING_MS`].
    pub latency: f64,
    pub upload: f64,
    pub upload_count: f64,
    pub download: f64,
    pub download_count: f64,
    pub upload_total: f64,
    pub upload_total_count: f64,
    pub download_total: f64,
    pub download_total_count: f64,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self {
            elapsed: f64::NAN,
            latency: f64::NAN,
            upload: f64::NAN,
            upload_count: f64::NAN,
            download: f64::NAN,
            download_count: f64::NAN,
            upload_total: f64::NAN,
            upload_total_count: f64::NAN,
            download_total: f64::NAN,
            download_total_count: f64::NAN,
        }
    }
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn counter(v: u64) -> f64 {
    v as f64
}

fn optional_counter(v: Option<u64>) -> f64 {
    v.map_or(f64::NAN, counter)
}

impl Telemetry {
    /// Fold one status report, taken `period` after the previous one, into
    /// the running statistics.
    pub fn apply(&self, status: &StatusResponse, period: Duration) -> Self {
        let step = period.as_secs_f64();
        let elapsed = if !status.run {
            f64::NAN
        } else if self.elapsed.is_nan() {
            step
        } else {
            self.elapsed + step
        };
        let latency = if status.latency > LATENCY_CEILING_MS {
            f64::INFINITY
        } else {
            counter(status.latency)
        };
        Self {
            elapsed,
            latency,
            upload: counter(status.upload),
            upload_count: counter(status.upload_count),
            download: counter(status.download),
            download_count: counter(status.download_count),
            upload_total: optional_counter(status.upload_total),
            upload_total_count: optional_counter(status.upload_total_count),
            download_total: optional_counter(status.download_total),
            download_total_count: optional_counter(status.download_total_count),
        }
    }
}

// ── Events, effects and actions ─────────────────────────────────────

/// Long-running backend operations. At most one is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Op {
    Run,
    Stop,
    Test,
    ListInterfaces,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Advance,
    Retreat,
    Begin(Op),
    RunSucceeded,
    RunFailed,
    StopSucceeded,
    StopFailed,
    /// A proxy test finished, successfully or not.
    TestFinished,
    /// An interface listing finished, successfully or not.
    InterfacesListed,
    /// A status report from a poller querying every `period`.
    StatusReceived {
        status: StatusResponse,
        period: Duration,
    },
    /// Saved configuration was restored at startup.
    ConfigRestored { ready: bool },
}

/// Side effects the owner of the wizard must carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    StartPolling,
    StopPolling,
}

/// Footer buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Action {
    Back,
    Next,
    #[strum(to_string = "Refresh")]
    RefreshInterfaces,
    #[strum(to_string = "Import")]
    ImportProxy,
    #[strum(to_string = "Export")]
    ExportProxy,
    #[strum(to_string = "Test")]
    TestProxy,
    Run,
    #[strum(to_string = "Run last")]
    RunSaved,
    Stop,
}

// ── Wizard ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Wizard {
    pub stage: Stage,
    /// The operation in flight, if any.
    pub busy: Option<Op>,
    /// A complete saved configuration exists and the last run did not fail.
    pub ready: bool,
    pub telemetry: Telemetry,
}

impl Wizard {
    pub fn is_busy(&self) -> bool {
        self.busy.is_some()
    }

    /// Clear `busy` if `op` is the operation in flight.
    fn finish(&mut self, op: Op) -> bool {
        if self.busy == Some(op) {
            self.busy = None;
            true
        } else {
            false
        }
    }
}

/// Apply one event. Events that do not apply in the current state leave it
/// unchanged and produce no effects.
pub fn reduce(state: &Wizard, event: Event) -> (Wizard, Vec<Effect>) {
    let mut next = state.clone();
    let mut effects = Vec::new();

    match event {
        Event::Advance => {
            if let (None, Some(stage)) = (next.busy, next.stage.next()) {
                next.stage = stage;
            }
        }
        Event::Retreat => {
            if let (None, Some(stage)) = (next.busy, next.stage.prev()) {
                next.stage = stage;
            }
        }
        Event::Begin(op) => {
            if next.busy.is_none() {
                next.busy = Some(op);
            }
        }
        Event::RunSucceeded => {
            if next.finish(Op::Run) && next.stage != Stage::Running {
                next.stage = Stage::Running;
                next.ready = true;
                next.telemetry = Telemetry::default();
                effects.push(Effect::StartPolling);
            }
        }
        Event::RunFailed => {
            if next.finish(Op::Run) {
                next.ready = false;
                next.telemetry = Telemetry::default();
            }
        }
        Event::StopSucceeded => {
            if next.finish(Op::Stop) && next.stage == Stage::Running {
                next.stage = Stage::Welcome;
                next.telemetry = Telemetry::default();
                effects.push(Effect::StopPolling);
            }
        }
        Event::StopFailed => {
            next.finish(Op::Stop);
        }
        Event::TestFinished => {
            next.finish(Op::Test);
        }
        Event::InterfacesListed => {
            next.finish(Op::ListInterfaces);
        }
        Event::StatusReceived { status, period } => {
            if next.stage == Stage::Running {
                next.telemetry = next.telemetry.apply(&status, period);
            }
        }
        Event::ConfigRestored { ready } => {
            next.ready = ready;
        }
    }

    (next, effects)
}

/// Footer actions enabled in this state, in display order. Nothing is
/// enabled while an operation is in flight.
pub fn available_actions(state: &Wizard) -> Vec<Action> {
    if state.is_busy() {
        return Vec::new();
    }
    match state.stage {
        Stage::Welcome => {
            let mut actions = vec![Action::Next];
            if state.ready {
                actions.push(Action::RunSaved);
            }
            actions
        }
        Stage::Interface => vec![Action::Back, Action::RefreshInterfaces, Action::Next],
        Stage::Device => vec![Action::Back, Action::Next],
        Stage::Proxy => vec![
            Action::Back,
            Action::ImportProxy,
            Action::ExportProxy,
            Action::TestProxy,
            Action::Run,
        ],
        Stage::Running => vec![Action::Stop],
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn at(stage: Stage) -> Wizard {
        Wizard {
            stage,
            ..Wizard::default()
        }
    }

    fn step(state: &Wizard, events: impl IntoIterator<Item = Event>) -> (Wizard, Vec<Effect>) {
        let mut state = state.clone();
        let mut all = Vec::new();
        for event in events {
            let (next, effects) = reduce(&state, event);
            state = next;
            all.extend(effects);
        }
        (state, all)
    }

    fn received(run: bool, latency: u64) -> Event {
        Event::StatusReceived {
            status: status(run, latency),
            period: Duration::from_secs(1),
        }
    }

    fn status(run: bool, latency: u64) -> StatusResponse {
        StatusResponse {
            run,
            latency,
            upload: 2_000_000,
            upload_count: 10,
            download: 500,
            download_count: 3,
            upload_total: None,
            upload_total_count: None,
            download_total: Some(4096),
            download_total_count: None,
        }
    }

    #[test]
    fn advance_walks_to_proxy_and_stops() {
        let (s, effects) = step(&Wizard::default(), std::iter::repeat_n(Event::Advance, 5));
        assert_eq!(s.stage, Stage::Proxy);
        assert!(effects.is_empty());
    }

    #[test]
    fn retreat_from_welcome_and_running_is_noop() {
        let (s, effects) = reduce(&at(Stage::Welcome), Event::Retreat);
        assert_eq!(s.stage, Stage::Welcome);
        assert!(effects.is_empty());
        let (s, _) = reduce(&at(Stage::Running), Event::Retreat);
        assert_eq!(s.stage, Stage::Running);
        let (s, _) = reduce(&at(Stage::Running), Event::Advance);
        assert_eq!(s.stage, Stage::Running);
    }

    #[test]
    fn retreat_steps_back() {
        let (s, _) = reduce(&at(Stage::Proxy), Event::Retreat);
        assert_eq!(s.stage, Stage::Device);
    }

    #[test]
    fn run_success_enters_running_and_starts_polling() {
        let (s, effects) = step(
            &at(Stage::Proxy),
            [Event::Begin(Op::Run), Event::RunSucceeded],
        );
        assert_eq!(s.stage, Stage::Running);
        assert!(s.ready);
        assert_eq!(s.busy, None);
        assert_eq!(effects, vec![Effect::StartPolling]);
    }

    #[test]
    fn run_success_without_begin_is_ignored() {
        let (s, effects) = reduce(&at(Stage::Proxy), Event::RunSucceeded);
        assert_eq!(s.stage, Stage::Proxy);
        assert!(effects.is_empty());
    }

    #[test]
    fn run_failure_stays_and_clears_ready() {
        let start = Wizard {
            stage: Stage::Welcome,
            ready: true,
            ..Wizard::default()
        };
        let (s, effects) = step(&start, [Event::Begin(Op::Run), Event::RunFailed]);
        assert_eq!(s.stage, Stage::Welcome);
        assert!(!s.ready);
        assert_eq!(s.busy, None);
        assert!(effects.is_empty());
    }

    #[test]
    fn stop_success_returns_to_welcome_once() {
        let (s, effects) = step(
            &at(Stage::Running),
            [
                Event::Begin(Op::Stop),
                Event::StopSucceeded,
                Event::StopSucceeded,
            ],
        );
        assert_eq!(s.stage, Stage::Welcome);
        assert_eq!(effects, vec![Effect::StopPolling]);
        assert!(s.telemetry.elapsed.is_nan());
    }

    #[test]
    fn stop_failure_keeps_running() {
        let (s, effects) = step(&at(Stage::Running), [Event::Begin(Op::Stop), Event::StopFailed]);
        assert_eq!(s.stage, Stage::Running);
        assert_eq!(s.busy, None);
        assert!(effects.is_empty());
    }

    #[test]
    fn busy_blocks_second_operation_and_navigation() {
        let (s, _) = step(
            &at(Stage::Interface),
            [Event::Begin(Op::ListInterfaces), Event::Begin(Op::Run), Event::Advance],
        );
        assert_eq!(s.busy, Some(Op::ListInterfaces));
        assert_eq!(s.stage, Stage::Interface);
        assert!(available_actions(&s).is_empty());

        let (s, _) = reduce(&s, Event::InterfacesListed);
        assert_eq!(s.busy, None);
    }

    #[test]
    fn telemetry_counts_elapsed_and_caps_latency() {
        let running = at(Stage::Running);
        let (s, _) = step(
            &running,
            [
                received(true, 42),
                received(true, 1001),
            ],
        );
        assert_eq!(s.telemetry.elapsed, 2.0);
        assert_eq!(s.telemetry.latency, f64::INFINITY);
        assert_eq!(s.telemetry.upload, 2_000_000.0);
        assert_eq!(s.telemetry.download_total, 4096.0);
        assert!(s.telemetry.upload_total.is_nan());

        let (s, _) = reduce(&s, received(false, 1000));
        assert!(s.telemetry.elapsed.is_nan());
        assert_eq!(s.telemetry.latency, 1000.0);
    }

    #[test]
    fn elapsed_advances_by_poll_period() {
        let quarter = Duration::from_millis(250);
        let (s, _) = step(
            &at(Stage::Running),
            std::iter::repeat_n(
                Event::StatusReceived {
                    status: status(true, 5),
                    period: quarter,
                },
                8,
            ),
        );
        assert_eq!(s.telemetry.elapsed, 2.0);

        let (s, _) = reduce(
            &s,
            Event::StatusReceived {
                status: status(true, 5),
                period: Duration::from_secs(2),
            },
        );
        assert_eq!(s.telemetry.elapsed, 4.0);
    }

    #[test]
    fn status_outside_running_is_ignored() {
        let (s, _) = reduce(&at(Stage::Proxy), received(true, 1));
        assert!(s.telemetry.elapsed.is_nan());
    }

    #[test]
    fn footer_actions_per_stage() {
        assert_eq!(available_actions(&at(Stage::Welcome)), vec![Action::Next]);
        let (ready, _) = reduce(&at(Stage::Welcome), Event::ConfigRestored { ready: true });
        assert_eq!(available_actions(&ready), vec![Action::Next, Action::RunSaved]);
        assert_eq!(
            available_actions(&at(Stage::Proxy)),
            vec![
                Action::Back,
                Action::ImportProxy,
                Action::ExportProxy,
                Action::TestProxy,
                Action::Run
            ]
        );
        assert_eq!(available_actions(&at(Stage::Running)), vec![Action::Stop]);
    }
}
