//! Interface listing.

use pcap2socks_api::InterfaceInfo;
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct InterfaceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Alias")]
    alias: String,
    #[tabled(rename = "MTU")]
    mtu: u32,
}

impl From<&InterfaceInfo> for InterfaceRow {
    fn from(i: &InterfaceInfo) -> Self {
        Self {
            name: i.name.clone(),
            alias: i.alias.clone().unwrap_or_default(),
            mtu: i.mtu,
        }
    }
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let settings = config::resolve_settings(global)?;
    let (mut session, _status) = config::connect(&settings)?;

    let interfaces = session.list_interfaces().await?;
    if interfaces.is_empty() {
        return Err(CliError::NoInterfaces);
    }

    let out = output::render_list(
        &global.output,
        &interfaces,
        |i| InterfaceRow::from(i),
        |i| i.name.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
