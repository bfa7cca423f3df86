//! Component trait, implemented by every wizard screen.

use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use pcap2socks_core::Form;
use ratatui::{Frame, layout::Rect};
use tokio::sync::mpsc::UnboundedSender;

use crate::action::Action;

/// Lifecycle: `init` → (`handle_key_event` | `update` | `render`)*
///
/// Screens that edit part of the [`Form`] copy their inputs into it with
/// `write_form` before the app validates, and refresh their inputs from it
/// on [`Action::LoadForm`].
pub trait Component: Send {
    fn init(&mut self, _action_tx: UnboundedSender<Action>) -> Result<()> {
        Ok(())
    }

    /// Handle a key the app did not consume. Return an Action to dispatch.
    fn handle_key_event(&mut self, _key: KeyEvent) -> Result<Option<Action>> {
        Ok(None)
    }

    /// Process a dispatched action. May return a follow-up action.
    fn update(&mut self, _action: &Action) -> Result<Option<Action>> {
        Ok(None)
    }

    fn write_form(&self, _form: &mut Form) {}

    fn render(&self, frame: &mut Frame, area: Rect);

    /// Key hints specific to this screen, shown before the footer buttons.
    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    fn id(&self) -> &str;
}
