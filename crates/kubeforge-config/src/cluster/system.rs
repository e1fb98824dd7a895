use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    cluster::{validate_entries, validate_entries_non_blank, validate_non_blank},
    errors::ValidationErrors,
    validation,
};

/// Operating system prerequisites applied to every node.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SystemConfig {
    /// NTP servers all nodes synchronize against, as IP addresses or domain
    /// names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ntp_servers: Option<Vec<String>>,

    /// The timezone set on all nodes, e.g. `Etc/UTC`. If not specified the
    /// node timezone is left untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    /// Additional RPM packages installed on RPM-based nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpms: Option<Vec<String>>,

    /// Additional DEB packages installed on DEB-based nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debs: Option<Vec<String>>,
}

impl SystemConfig {
    pub fn apply_defaults(&mut self) {
        self.ntp_servers.get_or_insert_default();
        // timezone has no default, an unset value leaves nodes untouched
        self.rpms.get_or_insert_default();
        self.debs.get_or_insert_default();
    }

    pub fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_entries(
            self.ntp_servers.as_deref(),
            validation::is_valid_host,
            "a valid IP address or domain name",
            &format!("{path}.ntpServers"),
            errors,
        );
        validate_non_blank(self.timezone.as_deref(), format!("{path}.timezone"), errors);
        validate_entries_non_blank(self.rpms.as_deref(), &format!("{path}.rpms"), errors);
        validate_entries_non_blank(self.debs.as_deref(), &format!("{path}.debs"), errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_system_config_defaults() {
        let mut system = SystemConfig::default();
        system.apply_defaults();

        assert_eq!(system.ntp_servers, Some(Vec::new()));
        assert_eq!(system.timezone, None);
        assert_eq!(system.rpms, Some(Vec::new()));
        assert_eq!(system.debs, Some(Vec::new()));

        let mut errors = ValidationErrors::new();
        system.validate_at("spec.system", &mut errors);
        assert!(errors.is_empty(), "unexpected errors:\n{errors}");
    }

    #[test]
    fn ntp_servers_must_be_hosts() {
        let system = SystemConfig {
            ntp_servers: Some(vec![
                "pool.ntp.org".to_owned(),
                "10.0.0.1".to_owned(),
                "not a host".to_owned(),
            ]),
            ..SystemConfig::default()
        };

        let mut errors = ValidationErrors::new();
        system.validate_at("spec.system", &mut errors);

        assert_eq!(errors.len(), 1);
        let error = errors.iter().next().expect("one error");
        assert_eq!(error.path, "spec.system.ntpServers[2]");
        assert_eq!(
            error.message,
            "\"not a host\" is not a valid IP address or domain name"
        );
    }

    #[test]
    fn blank_timezone_and_packages_are_rejected() {
        let system = SystemConfig {
            timezone: Some("  ".to_owned()),
            rpms: Some(vec!["socat".to_owned(), String::new()]),
            debs: Some(vec!["conntrack".to_owned()]),
            ..SystemConfig::default()
        };

        let mut errors = ValidationErrors::new();
        system.validate_at("spec.system", &mut errors);

        let paths = errors.iter().map(|error| error.path.as_str()).collect::<Vec<_>>();
        assert_eq!(paths, ["spec.system.timezone", "spec.system.rpms[1]"]);
    }
}
