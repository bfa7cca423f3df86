//! Wizard screens, one per stage.

pub mod device;
pub mod interface;
pub mod proxy;
pub mod running;
pub mod welcome;

use std::path::PathBuf;

use pcap2socks_core::Stage;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders};

use crate::component::Component;
use crate::theme;

/// Details shown on the welcome screen.
pub struct StartupInfo {
    pub endpoint: String,
    pub data_dir: PathBuf,
    pub exchange_dir: PathBuf,
}

pub fn create_screens(info: StartupInfo) -> Vec<(Stage, Box<dyn Component>)> {
    vec![
        (Stage::Welcome, Box::new(welcome::WelcomeScreen::new(info))),
        (Stage::Interface, Box::new(interface::InterfaceScreen::new())),
        (Stage::Device, Box::new(device::DeviceScreen::new())),
        (Stage::Proxy, Box::new(proxy::ProxyScreen::new())),
        (Stage::Running, Box::new(running::RunningScreen::new())),
    ]
}

/// Rounded panel with a cyan title, used as the frame of every screen.
fn screen_block(title: &str) -> Block<'static> {
    Block::default()
        .title(Line::from(vec![
            Span::raw(" "),
            Span::styled(title.to_owned(), theme::title_style()),
            Span::raw(" "),
        ]))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused())
}
