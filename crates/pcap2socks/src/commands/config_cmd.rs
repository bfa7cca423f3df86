//! Config subcommand handlers.

use std::path::PathBuf;

use pcap2socks_config::{FileSlots, Settings, export_proxy, import_proxy, settings_path};
use pcap2socks_core::model;
use pcap2socks_core::{Device, Form, Interface, Preset, Proxy, Record, SlotStore};
use serde::Serialize;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, PresetArg};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Views ───────────────────────────────────────────────────────────

/// Saved proxy with the password masked.
#[derive(Serialize)]
struct ProxyView {
    destination: String,
    authentication: bool,
    username: String,
    password: String,
    extra: String,
}

impl From<Proxy> for ProxyView {
    fn from(p: Proxy) -> Self {
        Self {
            destination: p.destination,
            authentication: p.authentication,
            username: p.username,
            password: if p.password.is_empty() {
                String::new()
            } else {
                "****".into()
            },
            extra: p.extra,
        }
    }
}

#[derive(Serialize)]
struct ConfigView {
    settings_path: PathBuf,
    settings: Settings,
    data_dir: PathBuf,
    interface: Option<Interface>,
    device: Option<Device>,
    proxy: Option<ProxyView>,
}

fn or_unset<T>(value: Option<&T>, f: impl Fn(&T) -> String) -> String {
    value.map_or_else(|| "(not set)".into(), f)
}

fn config_detail(view: &ConfigView) -> String {
    output::detail_lines(&[
        ("Settings file", view.settings_path.display().to_string()),
        ("Backend", view.settings.backend.endpoint.clone()),
        ("Timeout", format!("{}s", view.settings.backend.timeout_secs)),
        (
            "Status interval",
            format!("{}ms", view.settings.status_interval_ms),
        ),
        ("Data directory", view.data_dir.display().to_string()),
        (
            "Interface",
            or_unset(view.interface.as_ref(), |i| {
                format!("{} (MTU {})", i.interface, i.mtu)
            }),
        ),
        (
            "Device",
            or_unset(view.device.as_ref(), |d| match d.preset() {
                Some(Preset::Custom) if d.publish.is_empty() => {
                    format!("custom, source {}", d.source)
                }
                Some(Preset::Custom) => {
                    format!("custom, source {}, gateway {}", d.source, d.publish)
                }
                Some(preset) => preset.to_string(),
                None => format!("preset {}", d.preset),
            }),
        ),
        (
            "Proxy",
            or_unset(view.proxy.as_ref(), |p| {
                if p.authentication {
                    format!("{} (user {})", p.destination, p.username)
                } else {
                    p.destination.clone()
                }
            }),
        ),
    ])
}

fn preset_of(arg: PresetArg) -> Preset {
    match arg {
        PresetArg::Custom => Preset::Custom,
        PresetArg::Tencent => Preset::TencentAccelerator,
        PresetArg::Netease => Preset::NeteaseUu,
    }
}

fn saved(slots: &FileSlots, what: &str, quiet: bool) {
    if !quiet {
        eprintln!("Saved {what} to {}", slots.dir().display());
    }
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let settings = config::resolve_settings(global)?;
    let slots = settings.slots();

    match args.command {
        ConfigCommand::Show => {
            let view = ConfigView {
                settings_path: settings_path(),
                data_dir: settings.data_dir(),
                interface: model::load(&slots),
                device: model::load(&slots),
                proxy: model::load::<Proxy, _>(&slots).map(ProxyView::from),
                settings,
            };
            let out = output::render_single(&global.output, &view, config_detail, |v| {
                v.settings_path.display().to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&settings_path().display().to_string(), false);
            Ok(())
        }

        ConfigCommand::SetInterface { name, mtu } => {
            let form = Form {
                interface: name,
                mtu,
                ..Form::default()
            };
            // MTU 0 resolves against the backend's interface list.
            let interfaces = if mtu == 0 {
                let (mut session, _status) = config::connect(&settings)?;
                session.list_interfaces().await?
            } else {
                Vec::new()
            };
            if mtu == 0 && !interfaces.iter().any(|i| i.name == form.interface) {
                return Err(CliError::InterfaceMissing {
                    interface: form.interface,
                });
            }
            let record = form
                .interface_record(&interfaces)
                .ok_or_else(|| CliError::Validation {
                    field: "interface".into(),
                    reason: "name must be non-empty and MTU within 576-1500".into(),
                })?;
            model::save(&slots, &record)?;
            saved(
                &slots,
                &format!("interface {} (MTU {})", record.interface, record.mtu),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::SetDevice {
            preset,
            source,
            publish,
        } => {
            let record = Device::new(preset_of(preset).value(), source, publish)
                .checked()
                .ok_or_else(|| CliError::Validation {
                    field: "source".into(),
                    reason: "source address cannot be empty".into(),
                })?;
            model::save(&slots, &record)?;
            saved(&slots, "device", global.quiet);
            Ok(())
        }

        ConfigCommand::SetProxy {
            destination,
            username,
            password,
            extra,
        } => {
            let authentication = username.is_some();
            let password = match (&username, password) {
                (Some(_), Some(pw)) => pw,
                (Some(_), None) => {
                    rpassword::prompt_password("Password: ").map_err(util::prompt_err)?
                }
                (None, _) => String::new(),
            };
            let record = Proxy::new(
                destination,
                authentication,
                username.unwrap_or_default(),
                password,
                extra,
            )
            .checked()
            .ok_or_else(|| CliError::Validation {
                field: "destination".into(),
                reason: "proxy address cannot be empty".into(),
            })?;
            model::save(&slots, &record)?;
            saved(&slots, "proxy", global.quiet);
            Ok(())
        }

        ConfigCommand::Export { dir } => {
            let proxy: Proxy = util::load_record(&slots)?;
            let path = export_proxy(&dir, &proxy)?;
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Import { file } => {
            let proxy = import_proxy(&file)?;
            model::save(&slots, &proxy)?;
            saved(&slots, &format!("proxy {}", proxy.destination), global.quiet);
            Ok(())
        }

        ConfigCommand::Clear => {
            if !util::confirm(
                "Delete all saved configuration?",
                global.yes,
                "config clear",
            )? {
                return Ok(());
            }
            for slot in [Interface::SLOT, Device::SLOT, Proxy::SLOT] {
                slots.remove(slot)?;
            }
            if !global.quiet {
                eprintln!("Cleared saved configuration");
            }
            Ok(())
        }
    }
}
