//! Application core: event loop, wizard session, backend tasks and rendering.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pcap2socks_api::{Backend, InterfaceInfo, RunPayload, TestResponse};
use pcap2socks_config::{FileSlots, export_proxy, import_proxy};
use pcap2socks_core::{
    CoreError, EXPORT_FILE_NAME, Event, Form, Op, Profile, Session, Stage, StatusUpdate, wizard,
};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::event::{Event as TermEvent, EventReader};
use crate::screens::{StartupInfo, create_screens};
use crate::theme;
use crate::tui::Tui;

// ── Footer key bindings ─────────────────────────────────────────────

struct Binding {
    code: KeyCode,
    modifiers: KeyModifiers,
    label: &'static str,
}

impl Binding {
    fn matches(&self, key: KeyEvent) -> bool {
        key.code == self.code && key.modifiers == self.modifiers
    }
}

fn binding(action: wizard::Action) -> Binding {
    let (code, modifiers, label) = match action {
        wizard::Action::Back => (KeyCode::Esc, KeyModifiers::NONE, "Esc"),
        wizard::Action::Next | wizard::Action::Run => {
            (KeyCode::Enter, KeyModifiers::NONE, "Enter")
        }
        wizard::Action::RefreshInterfaces => (KeyCode::Char('r'), KeyModifiers::CONTROL, "^R"),
        wizard::Action::ImportProxy => (KeyCode::Char('o'), KeyModifiers::CONTROL, "^O"),
        wizard::Action::ExportProxy => (KeyCode::Char('s'), KeyModifiers::CONTROL, "^S"),
        wizard::Action::TestProxy => (KeyCode::Char('t'), KeyModifiers::CONTROL, "^T"),
        wizard::Action::RunSaved => (KeyCode::Char('r'), KeyModifiers::NONE, "r"),
        wizard::Action::Stop => (KeyCode::Char('s'), KeyModifiers::NONE, "s"),
    };
    Binding {
        code,
        modifiers,
        label,
    }
}

fn busy_label(op: Op) -> &'static str {
    match op {
        Op::Run => " Starting pcap2socks",
        Op::Stop => " Stopping pcap2socks",
        Op::Test => " Testing proxy",
        Op::ListInterfaces => " Listing interfaces",
    }
}

fn test_summary(resp: &TestResponse) -> String {
    match &resp.ip {
        Some(ip) => format!("NAT type {}, external IP {ip}", resp.nat),
        None => format!("NAT type {}", resp.nat),
    }
}

// ── App ─────────────────────────────────────────────────────────────

/// Top-level application state and event loop.
pub struct App<B: Backend> {
    session: Session<B>,
    status_rx: mpsc::UnboundedReceiver<StatusUpdate>,
    slots: FileSlots,
    /// Where `pcap2socks.json` is imported from and exported to.
    exchange_dir: PathBuf,
    /// Values behind every input, collected from the screens on demand.
    form: Form,
    interfaces: Vec<InterfaceInfo>,
    /// Saved slots are restored once, on the first interface listing.
    restored: bool,
    screens: HashMap<Stage, Box<dyn Component>>,
    running: bool,
    /// A status query failed and the user has been told; cleared by the
    /// next successful query.
    status_failing: bool,
    notifications: VecDeque<Notification>,
    throbber_state: ThrobberState,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl<B: Backend> App<B> {
    pub fn new(
        session: Session<B>,
        status_rx: mpsc::UnboundedReceiver<StatusUpdate>,
        slots: FileSlots,
        exchange_dir: PathBuf,
        info: StartupInfo,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            session,
            status_rx,
            slots,
            exchange_dir,
            form: Form::default(),
            interfaces: Vec::new(),
            restored: false,
            screens: create_screens(info).into_iter().collect(),
            running: true,
            status_failing: false,
            notifications: VecDeque::new(),
            throbber_state: ThrobberState::default(),
            action_tx,
            action_rx,
        }
    }

    /// Initialize screens and ask the backend for its interfaces.
    fn init(&mut self) -> Result<()> {
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }
        self.broadcast(&Action::LoadForm(Box::new(self.form.clone())))?;
        self.list_interfaces();
        Ok(())
    }

    /// Run the main event loop until the user quits.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.init()?;

        let mut events = EventReader::new(Duration::from_millis(100), Duration::from_millis(33));
        info!("TUI event loop started");

        while self.running {
            tokio::select! {
                event = events.next() => {
                    let Some(event) = event else { break };
                    let action = match event {
                        TermEvent::Key(key) => self.handle_key_event(key)?,
                        TermEvent::Resize(w, h) => Some(Action::Resize(w, h)),
                        TermEvent::Tick => Some(Action::Tick),
                        TermEvent::Render => Some(Action::Render),
                    };
                    if let Some(action) = action {
                        self.action_tx.send(action)?;
                    }
                }
                Some(update) = self.status_rx.recv() => self.on_status(update)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;
                if matches!(action, Action::Render) {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop();
        self.shutdown().await;
        tui.exit();
        info!("TUI event loop ended");
        Ok(())
    }

    // ── Input ───────────────────────────────────────────────────────

    /// Global keys first, then the footer buttons enabled in this state,
    /// then the active screen.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers == KeyModifiers::CONTROL && matches!(key.code, KeyCode::Char('c' | 'q'))
        {
            return Ok(Some(Action::Quit));
        }

        if !self.notifications.is_empty() {
            return Ok(matches!(key.code, KeyCode::Enter | KeyCode::Esc)
                .then_some(Action::DismissNotification));
        }

        if let Some(pressed) = wizard::available_actions(self.session.wizard())
            .into_iter()
            .find(|a| binding(*a).matches(key))
        {
            return Ok(Some(Action::Press(pressed)));
        }

        let stage = self.session.wizard().stage;
        match self.screens.get_mut(&stage) {
            Some(screen) => screen.handle_key_event(key),
            None => Ok(None),
        }
    }

    // ── Actions ─────────────────────────────────────────────────────

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,
            Action::Tick => {
                if self.session.wizard().is_busy() {
                    self.throbber_state.calc_next();
                }
            }
            Action::Render => {}
            Action::Resize(w, h) => debug!(width = w, height = h, "terminal resized"),

            Action::Press(pressed) => self.press(*pressed)?,

            Action::InterfacesLoaded(result) => {
                self.session.dispatch(Event::InterfacesListed);
                match result {
                    Ok(interfaces) => self.interfaces_loaded(interfaces, action)?,
                    Err(message) => {
                        self.notify(Notification::error("Could not list interfaces", message));
                    }
                }
            }
            Action::RunFinished(Ok(resp)) => {
                self.session.dispatch(Event::RunSucceeded);
                self.broadcast(&Action::RunStarted(resp.clone()))?;
            }
            Action::RunFinished(Err(message)) => {
                self.session.dispatch(Event::RunFailed);
                self.notify(Notification::error("Run failed", message));
            }
            Action::StopFinished(Ok(())) => {
                self.session.dispatch(Event::StopSucceeded);
                self.notify(Notification::info("Stopped", "pcap2socks is no longer running."));
            }
            Action::StopFinished(Err(message)) => {
                self.session.dispatch(Event::StopFailed);
                self.notify(Notification::error("Stop failed", message));
            }
            Action::TestFinished(result) => {
                self.session.dispatch(Event::TestFinished);
                match result {
                    Ok(resp) => self.notify(Notification::success("Proxy test", test_summary(resp))),
                    Err(message) => self.notify(Notification::error("Proxy test failed", message)),
                }
            }

            Action::Notify(notification) => self.notifications.push_back(notification.clone()),
            Action::DismissNotification => {
                self.notifications.pop_front();
            }

            other => self.broadcast(other)?,
        }
        Ok(())
    }

    fn press(&mut self, pressed: wizard::Action) -> Result<()> {
        let stage = self.session.wizard().stage;
        let screen = self.screens.get(&stage).map_or("-", |s| s.id());
        debug!(action = %pressed, screen, "footer action");
        self.sync_form();
        match pressed {
            wizard::Action::Back => {
                self.session.dispatch(Event::Retreat);
            }
            wizard::Action::Next => {
                if self.stage_valid() {
                    self.session.dispatch(Event::Advance);
                }
            }
            wizard::Action::RefreshInterfaces => self.list_interfaces(),
            wizard::Action::ImportProxy => self.import_proxy()?,
            wizard::Action::ExportProxy => self.export_proxy(),
            wizard::Action::TestProxy => self.test_proxy(),
            wizard::Action::Run => self.run_form(),
            wizard::Action::RunSaved => self.run_saved()?,
            wizard::Action::Stop => {
                if self.session.begin(Op::Stop).is_ok() {
                    let gateway = self.session.gateway();
                    self.spawn(async move { gateway.stop().await }, Action::StopFinished);
                }
            }
        }
        Ok(())
    }

    /// Whether the current stage's inputs allow moving on.
    fn stage_valid(&self) -> bool {
        match self.session.wizard().stage {
            Stage::Interface if self.interfaces.is_empty() => {
                self.notify(Notification::warning(
                    "No interface",
                    "The backend reported no network interface. Press ^R to ask again.",
                ));
                false
            }
            Stage::Interface if self.form.interface_record(&self.interfaces).is_none() => {
                self.notify(Notification::warning(
                    "Invalid interface",
                    "The MTU must be between 576 and 1500, or 0 to use the interface's own.",
                ));
                false
            }
            Stage::Device if self.form.device_record().is_none() => {
                self.notify(Notification::warning(
                    "Invalid device",
                    "The device source address cannot be empty.",
                ));
                false
            }
            _ => true,
        }
    }

    fn interfaces_loaded(&mut self, interfaces: &[InterfaceInfo], action: &Action) -> Result<()> {
        self.interfaces = interfaces.to_vec();
        if !self.restored {
            self.restored = true;
            let restored = self.form.restore(&self.slots, &self.interfaces);
            self.session.dispatch(Event::ConfigRestored {
                ready: restored.ready,
            });
            if restored.interface_missing {
                self.notify(Notification::warning(
                    "Saved interface missing",
                    "The network interface from the last run is no longer available. Pick another one.",
                ));
            }
        }
        if !self.form.select_interface(&self.interfaces) {
            self.notify(Notification::warning(
                "No interface",
                "The backend reported no network interface.",
            ));
        }
        self.broadcast(action)?;
        self.broadcast(&Action::LoadForm(Box::new(self.form.clone())))
    }

    // ── Commands ────────────────────────────────────────────────────

    fn list_interfaces(&mut self) {
        if self.session.begin(Op::ListInterfaces).is_ok() {
            let gateway = self.session.gateway();
            self.spawn(
                async move { gateway.list_interfaces().await },
                Action::InterfacesLoaded,
            );
        }
    }

    fn run_form(&mut self) {
        let profile = match self.form.profile(&self.interfaces) {
            Ok(profile) => profile,
            Err(e) => {
                self.notify(Notification::warning("Cannot run", e.to_string()));
                return;
            }
        };
        if let Err(e) = profile.save(&self.slots) {
            warn!(error = %e, "failed to save configuration");
            self.notify(Notification::warning(
                "Configuration not saved",
                format!("Running anyway: {e}"),
            ));
        }
        self.start_run(profile.run_payload());
    }

    fn run_saved(&mut self) -> Result<()> {
        let Some(profile) = Profile::load(&self.slots) else {
            self.notify(Notification::warning(
                "No saved configuration",
                "Go through the setup once to save one.",
            ));
            return Ok(());
        };
        if !self
            .interfaces
            .iter()
            .any(|i| i.name == profile.interface.interface)
        {
            self.notify(Notification::warning(
                "Saved interface missing",
                format!("'{}' is no longer available.", profile.interface.interface),
            ));
            return Ok(());
        }
        self.form.apply_interface(&profile.interface);
        self.form.apply_device(&profile.device);
        self.form.apply_proxy(&profile.proxy);
        self.broadcast(&Action::LoadForm(Box::new(self.form.clone())))?;
        self.start_run(profile.run_payload());
        Ok(())
    }

    fn start_run(&mut self, payload: RunPayload) {
        if self.session.begin(Op::Run).is_ok() {
            let gateway = self.session.gateway();
            self.spawn(async move { gateway.run(payload).await }, Action::RunFinished);
        }
    }

    fn test_proxy(&mut self) {
        let Some(payload) = self.form.test_payload() else {
            self.notify(Notification::warning(
                "Invalid proxy",
                "The proxy address cannot be empty.",
            ));
            return;
        };
        if self.session.begin(Op::Test).is_ok() {
            let gateway = self.session.gateway();
            self.spawn(async move { gateway.test(payload).await }, Action::TestFinished);
        }
    }

    fn import_proxy(&mut self) -> Result<()> {
        let path = self.exchange_dir.join(EXPORT_FILE_NAME);
        match import_proxy(&path) {
            Ok(proxy) => {
                self.form.apply_proxy(&proxy);
                self.broadcast(&Action::LoadForm(Box::new(self.form.clone())))?;
                self.notify(Notification::success(
                    "Imported",
                    format!("Proxy loaded from {}", path.display()),
                ));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "proxy import failed");
                self.notify(Notification::error("Import failed", e.to_string()));
            }
        }
        Ok(())
    }

    fn export_proxy(&self) {
        let Some(proxy) = self.form.proxy_record() else {
            self.notify(Notification::warning(
                "Invalid proxy",
                "The proxy address cannot be empty.",
            ));
            return;
        };
        match export_proxy(&self.exchange_dir, &proxy) {
            Ok(path) => self.notify(Notification::success(
                "Exported",
                format!("Proxy saved to {}", path.display()),
            )),
            Err(e) => {
                warn!(error = %e, "proxy export failed");
                self.notify(Notification::error("Export failed", e.to_string()));
            }
        }
    }

    /// Run a backend command in the background and feed its result back as
    /// an action.
    fn spawn<T, F>(&self, task: F, done: fn(Result<T, String>) -> Action)
    where
        T: Send + 'static,
        F: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = task.await.map_err(|e| {
                warn!(error = %e, "backend command failed");
                e.to_string()
            });
            let _ = tx.send(done(result));
        });
    }

    fn on_status(&mut self, update: StatusUpdate) -> Result<()> {
        match update {
            Ok(status) => {
                self.status_failing = false;
                let telemetry = self.session.receive_status(status).telemetry;
                self.action_tx.send(Action::TelemetryUpdated(telemetry))?;
            }
            Err(e) => {
                warn!(error = %e, "status query failed");
                if !self.status_failing {
                    self.status_failing = true;
                    self.notify(Notification::error("Status query failed", e.to_string()));
                }
            }
        }
        Ok(())
    }

    /// Leave the engine stopped on exit. A run still in flight is awaited
    /// first so its outcome decides whether a stop is needed.
    async fn shutdown(&mut self) {
        if self.session.wizard().busy == Some(Op::Run) {
            info!("waiting for pcap2socks to start before exit");
            while let Some(action) = self.action_rx.recv().await {
                if let Action::RunFinished(result) = &action {
                    self.session.dispatch(if result.is_ok() {
                        Event::RunSucceeded
                    } else {
                        Event::RunFailed
                    });
                    break;
                }
            }
        }
        if self.session.wizard().stage == Stage::Running {
            info!("stopping pcap2socks before exit");
            if let Err(e) = self.session.stop().await {
                warn!(error = %e, "stop on exit failed");
            }
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────

    fn sync_form(&mut self) {
        for screen in self.screens.values() {
            screen.write_form(&mut self.form);
        }
    }

    fn broadcast(&mut self, action: &Action) -> Result<()> {
        for screen in self.screens.values_mut() {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    fn notify(&self, notification: Notification) {
        let _ = self.action_tx.send(Action::Notify(notification));
    }

    // ── Rendering ───────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let layout = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

        let stage = self.session.wizard().stage;
        self.render_step_indicator(frame, layout[0], stage);
        if let Some(screen) = self.screens.get(&stage) {
            screen.render(frame, layout[1]);
        }
        self.render_footer(frame, layout[2], stage);

        if let Some(notification) = self.notifications.front() {
            self.render_notification(frame, layout[1], notification);
        }
    }

    #[allow(clippy::unused_self)]
    fn render_step_indicator(&self, frame: &mut Frame, area: Rect, stage: Stage) {
        let current = stage.index();
        let spans: Vec<Span> = Stage::ALL
            .iter()
            .enumerate()
            .flat_map(|(i, step)| {
                let style = if i == current {
                    Style::default()
                        .fg(theme::ELECTRIC_PURPLE)
                        .add_modifier(Modifier::BOLD)
                } else if i < current {
                    Style::default().fg(theme::SUCCESS_GREEN)
                } else {
                    Style::default().fg(theme::BORDER_GRAY)
                };
                let sep = if i + 1 < Stage::ALL.len() {
                    Span::styled(" > ", Style::default().fg(theme::BORDER_GRAY))
                } else {
                    Span::raw("")
                };
                vec![Span::styled(format!("{} {step}", i + 1), style), sep]
            })
            .collect();
        frame.render_widget(
            Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
            area,
        );
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect, stage: Stage) {
        if let Some(op) = self.session.wizard().busy {
            let throbber = Throbber::default()
                .label(busy_label(op))
                .style(Style::default().fg(theme::NEON_CYAN))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(throbber, area, &mut self.throbber_state.clone());
            return;
        }

        let hint = |key: &str, label: String| {
            [
                Span::styled(format!(" {key} "), theme::key_hint_key()),
                Span::styled(format!("{label} "), theme::key_hint()),
            ]
        };
        let mut spans: Vec<Span> = Vec::new();
        if let Some(screen) = self.screens.get(&stage) {
            for (key, label) in screen.hints() {
                spans.extend(hint(key, (*label).to_owned()));
            }
        }
        spans.push(Span::styled("│", theme::muted()));
        for action in wizard::available_actions(self.session.wizard()) {
            spans.extend(hint(binding(action).label, action.to_string()));
        }
        spans.extend(hint("^C", "Quit".to_owned()));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    /// Modal notice centered over the screen.
    fn render_notification(&self, frame: &mut Frame, area: Rect, notification: &Notification) {
        let (color, icon) = match notification.level {
            NotificationLevel::Success => (theme::SUCCESS_GREEN, "✓"),
            NotificationLevel::Error => (theme::ERROR_RED, "✗"),
            NotificationLevel::Warning => (theme::ELECTRIC_YELLOW, "!"),
            NotificationLevel::Info => (theme::NEON_CYAN, "·"),
        };

        let width = 60u16.min(area.width.saturating_sub(4));
        let text_width = usize::from(width.saturating_sub(4)).max(1);
        let rows = notification.message.chars().count().div_ceil(text_width).max(1);
        let height = (u16::try_from(rows).unwrap_or(u16::MAX).saturating_add(4))
            .min(area.height.saturating_sub(2));
        let popup = Rect::new(
            area.x + area.width.saturating_sub(width) / 2,
            area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        );

        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(Line::from(vec![
                Span::styled(format!(" {icon} "), Style::default().fg(color)),
                Span::styled(
                    format!("{} ", notification.title),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
            ]))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(color))
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let layout = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner);
        frame.render_widget(
            Paragraph::new(Span::styled(
                notification.message.as_str(),
                Style::default().fg(theme::DIM_WHITE),
            ))
            .wrap(Wrap { trim: true }),
            layout[0],
        );

        let pending = self.notifications.len().saturating_sub(1);
        let footer = if pending == 0 {
            "Enter to dismiss".to_owned()
        } else {
            format!("Enter to dismiss ({pending} more)")
        };
        frame.render_widget(
            Paragraph::new(Span::styled(footer, theme::key_hint())).alignment(Alignment::Right),
            layout[1],
        );
    }
}
