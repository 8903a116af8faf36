//! The HQ state document: federation settings and every `WireGuard`
//! configuration the HQ manages, grouped by kind.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use wgf_store::ConfigurationData;
use wgf_wireguard::{InterfaceKind, WireGuardError, WireguardConfiguration, deep_merge};

use crate::error::{Error, Result};

/// Name of a freshly bootstrapped federation.
pub const DEFAULT_FEDERATION_NAME: &str = "wg-federation0";

/// Ports handed out to forum interfaces.
pub const DEFAULT_FORUM_PORTS: RangeInclusive<u16> = 10100..=10199;

/// Ports handed out to phone line interfaces.
pub const DEFAULT_PHONE_LINE_PORTS: RangeInclusive<u16> = 10200..=10299;

/// Federation-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FederationDocument")]
pub struct Federation {
    name: String,
    forum_min_port: u16,
    forum_max_port: u16,
    phone_line_min_port: u16,
    phone_line_max_port: u16,
}

#[derive(Deserialize)]
#[serde(default)]
struct FederationDocument {
    name: String,
    forum_min_port: u16,
    forum_max_port: u16,
    phone_line_min_port: u16,
    phone_line_max_port: u16,
}

impl Default for FederationDocument {
    fn default() -> Self {
        Self {
            name: DEFAULT_FEDERATION_NAME.to_string(),
            forum_min_port: *DEFAULT_FORUM_PORTS.start(),
            forum_max_port: *DEFAULT_FORUM_PORTS.end(),
            phone_line_min_port: *DEFAULT_PHONE_LINE_PORTS.start(),
            phone_line_max_port: *DEFAULT_PHONE_LINE_PORTS.end(),
        }
    }
}

impl TryFrom<FederationDocument> for Federation {
    type Error = WireGuardError;

    fn try_from(document: FederationDocument) -> std::result::Result<Self, WireGuardError> {
        Self::new(
            document.name,
            document.forum_min_port..=document.forum_max_port,
            document.phone_line_min_port..=document.phone_line_max_port,
        )
    }
}

impl Federation {
    /// Creates federation settings.
    ///
    /// # Errors
    ///
    /// Returns [`WireGuardError::DataValidation`] for a blank name, an empty
    /// port range, or overlapping ranges.
    pub fn new(
        name: impl Into<String>,
        forum_ports: RangeInclusive<u16>,
        phone_line_ports: RangeInclusive<u16>,
    ) -> std::result::Result<Self, WireGuardError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(WireGuardError::validation("federation.name", "must not be blank"));
        }
        for (field, range) in [
            ("federation.forum_ports", &forum_ports),
            ("federation.phone_line_ports", &phone_line_ports),
        ] {
            if range.is_empty() || *range.start() == 0 {
                return Err(WireGuardError::validation(
                    field,
                    format!("{}..={} is not a usable port range", range.start(), range.end()),
                ));
            }
        }
        if forum_ports.start() <= phone_line_ports.end() && phone_line_ports.start() <= forum_ports.end() {
            return Err(WireGuardError::validation(
                "federation.phone_line_ports",
                "must not overlap forum ports",
            ));
        }
        Ok(Self {
            name,
            forum_min_port: *forum_ports.start(),
            forum_max_port: *forum_ports.end(),
            phone_line_min_port: *phone_line_ports.start(),
            phone_line_max_port: *phone_line_ports.end(),
        })
    }

    /// Federation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Forum listen ports.
    #[must_use]
    pub const fn forum_ports(&self) -> RangeInclusive<u16> {
        self.forum_min_port..=self.forum_max_port
    }

    /// Phone line listen ports.
    #[must_use]
    pub const fn phone_line_ports(&self) -> RangeInclusive<u16> {
        self.phone_line_min_port..=self.phone_line_max_port
    }
}

impl Default for Federation {
    fn default() -> Self {
        Self {
            name: DEFAULT_FEDERATION_NAME.to_string(),
            forum_min_port: *DEFAULT_FORUM_PORTS.start(),
            forum_max_port: *DEFAULT_FORUM_PORTS.end(),
            phone_line_min_port: *DEFAULT_PHONE_LINE_PORTS.start(),
            phone_line_max_port: *DEFAULT_PHONE_LINE_PORTS.end(),
        }
    }
}

type Configurations = BTreeMap<String, WireguardConfiguration>;

/// Everything the HQ knows, as persisted in the state file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HqState {
    federation: Federation,
    interfaces: Configurations,
    forums: Configurations,
    phone_lines: Configurations,
}

impl HqState {
    /// Creates a state without configurations.
    #[must_use]
    pub fn new(federation: Federation) -> Self {
        Self {
            federation,
            interfaces: Configurations::new(),
            forums: Configurations::new(),
            phone_lines: Configurations::new(),
        }
    }

    /// Builds and validates a state from its document form.
    ///
    /// Missing sections are empty. Every configuration must be stored under
    /// its own name and in the section of its kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WireGuard`] naming the first invalid entry.
    pub fn from_dict(document: &Value) -> Result<Self> {
        let federation: Federation = match section(document, "federation") {
            Value::Null => Federation::default(),
            value => serde_json::from_value(value.clone())
                .map_err(|e| WireGuardError::validation("federation", e.to_string()))?,
        };

        let mut state = Self::new(federation);
        for kind in InterfaceKind::ALL {
            let configurations = WireguardConfiguration::try_from_dict_of_dicts(section(document, kind.as_str()))
                .map_err(|e| prefixed(kind, e))?;
            for (name, configuration) in configurations {
                if configuration.name() != name {
                    return Err(WireGuardError::validation(
                        format!("{kind}.{name}.name"),
                        format!("'{}' does not match its key", configuration.name()),
                    )
                    .into());
                }
                if configuration.kind() != kind {
                    return Err(WireGuardError::validation(
                        format!("{kind}.{name}.kind"),
                        format!("'{}' is stored under {kind}", configuration.kind()),
                    )
                    .into());
                }
                state.configurations_mut(kind).insert(name, configuration);
            }
        }
        Ok(state)
    }

    /// Document form, accepted back by [`Self::from_dict`].
    ///
    /// # Errors
    ///
    /// Fails only if a path is not valid UTF-8.
    pub fn to_dict(&self) -> Result<ConfigurationData> {
        match serde_json::to_value(self) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(_) => Err(WireGuardError::validation("state", "did not serialize to an object").into()),
            Err(e) => Err(WireGuardError::validation("state", e.to_string()).into()),
        }
    }

    /// Deep-merges `changes` into the document form and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WireGuard`] if the merged state is invalid.
    pub fn with_changes(&self, changes: Value) -> Result<Self> {
        let mut document = Value::Object(self.to_dict()?);
        deep_merge(&mut document, changes);
        Self::from_dict(&document)
    }

    /// Returns a copy holding `configuration` under its kind and name,
    /// replacing any previous one.
    #[must_use]
    pub fn with_configuration(&self, configuration: WireguardConfiguration) -> Self {
        let mut state = self.clone();
        state
            .configurations_mut(configuration.kind())
            .insert(configuration.name().to_string(), configuration);
        state
    }

    /// Federation settings.
    #[must_use]
    pub const fn federation(&self) -> &Federation {
        &self.federation
    }

    /// Configurations of one kind, by name.
    #[must_use]
    pub const fn configurations(&self, kind: InterfaceKind) -> &BTreeMap<String, WireguardConfiguration> {
        match kind {
            InterfaceKind::Interface => &self.interfaces,
            InterfaceKind::Forum => &self.forums,
            InterfaceKind::PhoneLine => &self.phone_lines,
        }
    }

    /// Every configuration, kind by kind.
    pub fn all_configurations(&self) -> impl Iterator<Item = &WireguardConfiguration> {
        InterfaceKind::ALL
            .into_iter()
            .flat_map(|kind| self.configurations(kind).values())
    }

    /// Looks up one configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationNotFound`] if there is none.
    pub fn configuration(&self, kind: InterfaceKind, name: &str) -> Result<&WireguardConfiguration> {
        self.configurations(kind)
            .get(name)
            .ok_or_else(|| Error::ConfigurationNotFound {
                kind,
                name: name.to_string(),
            })
    }

    fn configurations_mut(&mut self, kind: InterfaceKind) -> &mut Configurations {
        match kind {
            InterfaceKind::Interface => &mut self.interfaces,
            InterfaceKind::Forum => &mut self.forums,
            InterfaceKind::PhoneLine => &mut self.phone_lines,
        }
    }
}

fn section<'a>(document: &'a Value, key: &str) -> &'a Value {
    document.get(key).unwrap_or(&Value::Null)
}

fn prefixed(kind: InterfaceKind, error: WireGuardError) -> Error {
    match error {
        WireGuardError::DataValidation { field, reason } => {
            WireGuardError::validation(format!("{kind}.{field}"), reason).into()
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wgf_wireguard::{WireguardInterface, WireguardKeyGenerator};

    fn configuration(kind: InterfaceKind, name: &str) -> WireguardConfiguration {
        let generator = WireguardKeyGenerator::new();
        WireguardConfiguration::builder()
            .interface(
                WireguardInterface::builder()
                    .key_pair(generator.generate_key_pair())
                    .build()
                    .expect("interface"),
            )
            .name(name)
            .kind(kind)
            .shared_psk(generator.generate_psk())
            .path(format!("/etc/wireguard/{kind}/{name}.conf"))
            .build()
            .expect("configuration")
    }

    fn state() -> HqState {
        HqState::new(Federation::default())
            .with_configuration(configuration(InterfaceKind::Forum, "wgf-forum0"))
            .with_configuration(configuration(InterfaceKind::Interface, "wg-federation0"))
    }

    #[test]
    fn federation_defaults() {
        let federation = Federation::default();
        assert_eq!(federation.name(), DEFAULT_FEDERATION_NAME);
        assert_eq!(federation.forum_ports(), DEFAULT_FORUM_PORTS);
        assert_eq!(federation.phone_line_ports(), DEFAULT_PHONE_LINE_PORTS);
    }

    #[test]
    fn federation_rejects_bad_ranges() {
        assert!(Federation::new("f", 10..=5, 20..=30).is_err());
        assert!(Federation::new("f", 0..=5, 20..=30).is_err());
        assert!(Federation::new("f", 10..=25, 20..=30).is_err());
        assert!(Federation::new(" ", 10..=15, 20..=30).is_err());
        assert!(Federation::new("f", 10..=15, 20..=30).is_ok());
    }

    #[test]
    fn document_round_trips() {
        let state = state();
        let document = Value::Object(state.to_dict().expect("document"));
        assert!(document["phone_lines"].as_object().expect("section").is_empty());
        assert_eq!(HqState::from_dict(&document).expect("valid"), state);
    }

    #[test]
    fn missing_sections_are_empty() {
        let state = HqState::from_dict(&json!({})).expect("valid");
        assert_eq!(state.federation(), &Federation::default());
        assert_eq!(state.all_configurations().count(), 0);
    }

    #[test]
    fn rejects_configuration_under_wrong_name_or_kind() {
        let forum = configuration(InterfaceKind::Forum, "wgf-forum0");
        let document = forum.to_dict().expect("document");

        let renamed = json!({"forums": {"other": document.clone()}});
        assert!(HqState::from_dict(&renamed).is_err());

        let misplaced = json!({"interfaces": {"wgf-forum0": document}});
        assert!(HqState::from_dict(&misplaced).is_err());
    }

    #[test]
    fn invalid_entry_names_its_section() {
        let err = HqState::from_dict(&json!({"forums": {"wgf-forum0": {}}})).expect_err("invalid");
        assert!(matches!(
            err,
            Error::WireGuard(WireGuardError::DataValidation { ref field, .. }) if field == "forums.wgf-forum0.interface"
        ));
    }

    #[test]
    fn with_changes_merges_into_configuration() {
        let state = state();
        let changed = state
            .with_changes(json!({"forums": {"wgf-forum0": {"interface": {"listen_port": 10101}}}}))
            .expect("valid");
        let forum = changed
            .configuration(InterfaceKind::Forum, "wgf-forum0")
            .expect("forum");
        assert_eq!(forum.interface().listen_port(), 10101);
        assert_eq!(
            state.configuration(InterfaceKind::Forum, "wgf-forum0").expect("forum").interface().listen_port(),
            wgf_wireguard::DEFAULT_LISTEN_PORT
        );
    }

    #[test]
    fn lookup_reports_missing_configuration() {
        assert!(matches!(
            state().configuration(InterfaceKind::PhoneLine, "nope"),
            Err(Error::ConfigurationNotFound { kind: InterfaceKind::PhoneLine, .. })
        ));
    }
}
