// ── Wizard form ──
//
// The raw field values the wizard edits, and the `Profile` (the three
// validated records) built from them. A profile is what gets persisted and
// what `run` sends.

use pcap2socks_api::{InterfaceInfo, RunPayload, TestPayload};
use tracing::warn;

use crate::error::CoreError;
use crate::model::interface::MTU_MAX;
use crate::model::{self, Device, Interface, Preset, Proxy, Record, SlotStore};

/// Editable values behind every wizard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub interface: String,
    /// `0` selects the interface's own MTU.
    pub mtu: u32,
    pub preset: u8,
    pub source: String,
    pub publish: String,
    pub destination: String,
    pub authentication: bool,
    pub username: String,
    pub password: String,
    pub extra: String,
}

impl Default for Form {
    fn default() -> Self {
        Self {
            interface: String::new(),
            mtu: 0,
            preset: Preset::default().value(),
            source: "10.6.0.1".into(),
            publish: "10.6.0.2".into(),
            destination: "localhost:1080".into(),
            authentication: false,
            username: String::new(),
            password: String::new(),
            extra: String::new(),
        }
    }
}

impl Form {
    /// Interface record for the current selection. An MTU of `0` resolves to
    /// the selected interface's MTU, capped at [`MTU_MAX`].
    pub fn interface_record(&self, interfaces: &[InterfaceInfo]) -> Option<Interface> {
        let mtu = if self.mtu == 0 {
            interfaces
                .iter()
                .find(|i| i.name == self.interface)
                .map(|i| i.mtu.min(MTU_MAX))?
        } else {
            self.mtu
        };
        Interface::new(&self.interface, mtu).checked()
    }

    pub fn device_record(&self) -> Option<Device> {
        Device::new(self.preset, &self.source, &self.publish).checked()
    }

    pub fn proxy_record(&self) -> Option<Proxy> {
        Proxy::new(
            &self.destination,
            self.authentication,
            &self.username,
            &self.password,
            &self.extra,
        )
        .checked()
    }

    /// Build a profile, reporting the first record that does not validate.
    pub fn profile(&self, interfaces: &[InterfaceInfo]) -> Result<Profile, CoreError> {
        let interface = self
            .interface_record(interfaces)
            .ok_or(CoreError::InvalidConfig {
                slot: Interface::SLOT,
            })?;
        let device = self
            .device_record()
            .ok_or(CoreError::InvalidConfig { slot: Device::SLOT })?;
        let proxy = self
            .proxy_record()
            .ok_or(CoreError::InvalidConfig { slot: Proxy::SLOT })?;
        Ok(Profile {
            interface,
            device,
            proxy,
        })
    }

    pub fn apply_interface(&mut self, interface: &Interface) {
        self.interface.clone_from(&interface.interface);
        self.mtu = interface.mtu;
    }

    pub fn apply_device(&mut self, device: &Device) {
        self.preset = device.preset;
        self.source.clone_from(&device.source);
        self.publish.clone_from(&device.publish);
    }

    pub fn apply_proxy(&mut self, proxy: &Proxy) {
        self.destination.clone_from(&proxy.destination);
        self.authentication = proxy.authentication;
        self.username.clone_from(&proxy.username);
        self.password.clone_from(&proxy.password);
        self.extra.clone_from(&proxy.extra);
    }

    /// Point the interface selector at the first listed interface unless the
    /// current one is still present. Returns `false` when the list is empty.
    pub fn select_interface(&mut self, interfaces: &[InterfaceInfo]) -> bool {
        match interfaces.first() {
            None => {
                self.interface.clear();
                false
            }
            Some(first) => {
                if !interfaces.iter().any(|i| i.name == self.interface) {
                    self.interface.clone_from(&first.name);
                }
                true
            }
        }
    }

    /// Load saved slots into the form.
    ///
    /// A saved interface is only applied when it is still in `interfaces`.
    /// The result says whether a complete configuration was restored.
    pub fn restore<S: SlotStore + ?Sized>(
        &mut self,
        store: &S,
        interfaces: &[InterfaceInfo],
    ) -> Restored {
        let device = model::load::<Device, _>(store);
        if let Some(device) = &device {
            self.apply_device(device);
        }
        let proxy = model::load::<Proxy, _>(store);
        if let Some(proxy) = &proxy {
            self.apply_proxy(proxy);
        }

        if interfaces.is_empty() {
            return Restored::default();
        }
        match model::load::<Interface, _>(store) {
            None => Restored::default(),
            Some(saved) if interfaces.iter().any(|i| i.name == saved.interface) => {
                self.apply_interface(&saved);
                Restored {
                    ready: device.is_some() && proxy.is_some(),
                    interface_missing: false,
                }
            }
            Some(saved) => {
                warn!(interface = %saved.interface, "saved interface no longer present");
                Restored {
                    ready: false,
                    interface_missing: true,
                }
            }
        }
    }

    pub fn test_payload(&self) -> Option<TestPayload> {
        self.proxy_record().map(|p| test_payload(&p))
    }
}

/// Outcome of [`Form::restore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Restored {
    /// All three slots held valid records and the saved interface exists.
    pub ready: bool,
    /// A saved interface was found but the backend no longer lists it.
    pub interface_missing: bool,
}

// ── Profile ─────────────────────────────────────────────────────────

/// A complete, validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub interface: Interface,
    pub device: Device,
    pub proxy: Proxy,
}

impl Profile {
    /// Load all three slots, or `None` if any is absent or invalid.
    pub fn load<S: SlotStore + ?Sized>(store: &S) -> Option<Self> {
        Some(Self {
            interface: model::load(store)?,
            device: model::load(store)?,
            proxy: model::load(store)?,
        })
    }

    pub fn save<S: SlotStore + ?Sized>(&self, store: &S) -> Result<(), S::Error> {
        model::save(store, &self.interface)?;
        model::save(store, &self.device)?;
        model::save(store, &self.proxy)
    }

    pub fn run_payload(&self) -> RunPayload {
        RunPayload {
            interface: self.interface.interface.clone(),
            mtu: self.interface.mtu,
            preset: self.device.preset,
            source: self.device.source.clone(),
            publish: self.device.publish.clone(),
            destination: self.proxy.destination.clone(),
            authentication: self.proxy.authentication,
            username: self.proxy.username.clone(),
            password: self.proxy.password.clone(),
            extra: self.proxy.extra.clone(),
        }
    }
}

pub fn test_payload(proxy: &Proxy) -> TestPayload {
    TestPayload {
        destination: proxy.destination.clone(),
        authentication: proxy.authentication,
        username: proxy.username.clone(),
        password: proxy.password.clone(),
        extra: proxy.extra.clone(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct Slots(RefCell<HashMap<String, String>>);

    impl SlotStore for Slots {
        type Error = std::io::Error;

        fn read(&self, slot: &str) -> Result<Option<String>, Self::Error> {
            Ok(self.0.borrow().get(slot).cloned())
        }

        fn write(&self, slot: &str, text: &str) -> Result<(), Self::Error> {
            self.0.borrow_mut().insert(slot.into(), text.into());
            Ok(())
        }

        fn remove(&self, slot: &str) -> Result<(), Self::Error> {
            self.0.borrow_mut().remove(slot);
            Ok(())
        }
    }

    fn nic(name: &str, mtu: u32) -> InterfaceInfo {
        InterfaceInfo {
            name: name.into(),
            alias: None,
            mtu,
        }
    }

    #[test]
    fn zero_mtu_uses_interface_mtu_capped() {
        let form = Form {
            interface: "eth0".into(),
            ..Form::default()
        };
        assert_eq!(
            form.interface_record(&[nic("eth0", 9000)]),
            Some(Interface::new("eth0", 1500))
        );
        assert_eq!(
            form.interface_record(&[nic("eth0", 1400)]),
            Some(Interface::new("eth0", 1400))
        );
        assert_eq!(form.interface_record(&[nic("wlan0", 1500)]), None);
    }

    #[test]
    fn profile_reports_first_invalid_record() {
        let form = Form {
            interface: "eth0".into(),
            destination: String::new(),
            ..Form::default()
        };
        let err = form.profile(&[nic("eth0", 1500)]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig { slot: "proxy" }));

        let err = Form::default().profile(&[]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig { slot: "interface" }));
    }

    #[test]
    fn profile_merges_into_run_payload() {
        let form = Form {
            interface: "eth0".into(),
            mtu: 1400,
            ..Form::default()
        };
        let payload = form.profile(&[]).unwrap().run_payload();
        assert_eq!(payload.interface, "eth0");
        assert_eq!(payload.mtu, 1400);
        assert_eq!(payload.preset, 1);
        assert_eq!(payload.source, "10.6.0.1");
        assert_eq!(payload.destination, "localhost:1080");
    }

    #[test]
    fn restore_is_ready_only_with_present_interface() {
        let slots = Slots::default();
        let profile = Profile {
            interface: Interface::new("eth1", 1400),
            device: Device::new(0, "192.168.1.10", ""),
            proxy: Proxy::anonymous("proxy:1080"),
        };
        profile.save(&slots).unwrap();

        let mut form = Form::default();
        let restored = form.restore(&slots, &[nic("eth0", 1500), nic("eth1", 1500)]);
        assert_eq!(restored, Restored { ready: true, interface_missing: false });
        assert_eq!(form.interface, "eth1");
        assert_eq!(form.mtu, 1400);
        assert_eq!(form.source, "192.168.1.10");

        let mut form = Form::default();
        let restored = form.restore(&slots, &[nic("eth0", 1500)]);
        assert_eq!(restored, Restored { ready: false, interface_missing: true });
        assert_eq!(form.destination, "proxy:1080");
        assert_eq!(form.interface, "");
    }

    #[test]
    fn restore_without_device_is_not_ready() {
        let slots = Slots::default();
        model::save(&slots, &Interface::new("eth0", 1500)).unwrap();
        model::save(&slots, &Proxy::anonymous("proxy:1080")).unwrap();
        let restored = Form::default().restore(&slots, &[nic("eth0", 1500)]);
        assert!(!restored.ready);
        assert!(Profile::load(&slots).is_none());
    }

    #[test]
    fn select_interface_keeps_current_when_listed() {
        let mut form = Form {
            interface: "eth1".into(),
            ..Form::default()
        };
        assert!(form.select_interface(&[nic("eth0", 1500), nic("eth1", 1500)]));
        assert_eq!(form.interface, "eth1");
        assert!(form.select_interface(&[nic("eth0", 1500)]));
        assert_eq!(form.interface, "eth0");
        assert!(!form.select_interface(&[]));
        assert_eq!(form.interface, "");
    }
}
