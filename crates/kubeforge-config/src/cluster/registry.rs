use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    cluster::{validate_entries, validate_entries_non_blank, validate_non_blank},
    errors::{ValidationErrors, key_path},
    validation,
};

/// Image registry access.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    /// The registry all images are pulled from, as `host` or `host:port`.
    /// Defaults to empty, meaning the upstream registries of the images are
    /// used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_registry: Option<String>,

    /// Replaces the namespace of all images, e.g. `registry.local/<override>/pause`.
    /// Defaults to empty, meaning image namespaces are kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_override: Option<String>,

    /// Per-registry credentials, keyed by registry `host` or `host:port`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auths: Option<BTreeMap<String, RegistryAuth>>,

    /// Registry mirror URLs, in order of preference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_mirrors: Option<Vec<String>>,

    /// Registries that may be contacted over plain HTTP or with unverified
    /// TLS, as `host` or `host:port`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure_registries: Option<Vec<String>>,
}

impl RegistryConfig {
    pub fn apply_defaults(&mut self) {
        self.private_registry.get_or_insert_default();
        self.namespace_override.get_or_insert_default();
        self.auths.get_or_insert_default();
        self.registry_mirrors.get_or_insert_default();
        self.insecure_registries.get_or_insert_default();

        if let Some(auths) = &mut self.auths {
            for auth in auths.values_mut() {
                auth.apply_defaults();
            }
        }
    }

    pub fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        // Both scalars default to empty, only set values are checked
        if let Some(private_registry) = self.private_registry.as_deref() {
            if !private_registry.is_empty() && !validation::is_valid_host_port(private_registry) {
                errors.add(
                    format!("{path}.privateRegistry"),
                    format!("{private_registry:?} is not a valid host or host:port pair"),
                );
            }
        }
        if let Some(namespace_override) = self.namespace_override.as_deref() {
            if !namespace_override.is_empty() && !validation::is_valid_domain(namespace_override) {
                errors.add(
                    format!("{path}.namespaceOverride"),
                    format!("{namespace_override:?} is not a valid image namespace"),
                );
            }
        }

        if let Some(auths) = &self.auths {
            let auths_path = format!("{path}.auths");
            for (registry, auth) in auths {
                let entry_path = key_path(&auths_path, registry);
                if !validation::is_valid_host_port(registry) {
                    errors.add(
                        &entry_path,
                        format!("{registry:?} is not a valid host or host:port pair"),
                    );
                }
                auth.validate_at(&entry_path, errors);
            }
        }

        validate_entries_non_blank(
            self.registry_mirrors.as_deref(),
            &format!("{path}.registryMirrors"),
            errors,
        );
        validate_entries(
            self.insecure_registries.as_deref(),
            validation::is_valid_host_port,
            "a valid host or host:port pair",
            &format!("{path}.insecureRegistries"),
            errors,
        );
    }
}

/// Credentials and transport settings for one registry.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryAuth {
    /// The username used to authenticate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// The password used to authenticate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Whether the registry certificate is accepted without verification.
    /// Defaults to false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_tls_verify: Option<bool>,

    /// Whether the registry is contacted over plain HTTP. Defaults to false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plain_http: Option<bool>,
}

impl RegistryAuth {
    fn apply_defaults(&mut self) {
        self.skip_tls_verify.get_or_insert(false);
        self.plain_http.get_or_insert(false);
    }

    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_non_blank(self.username.as_deref(), format!("{path}.username"), errors);
        validate_non_blank(self.password.as_deref(), format!("{path}.password"), errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_registry_config_defaults() {
        let mut registry = RegistryConfig::default();
        registry.apply_defaults();

        assert_eq!(registry.private_registry.as_deref(), Some(""));
        assert_eq!(registry.namespace_override.as_deref(), Some(""));
        assert_eq!(registry.auths, Some(BTreeMap::new()));
        assert_eq!(registry.registry_mirrors, Some(Vec::new()));
        assert_eq!(registry.insecure_registries, Some(Vec::new()));

        let mut errors = ValidationErrors::new();
        registry.validate_at("spec.registry", &mut errors);
        assert!(errors.is_empty(), "unexpected errors:\n{errors}");
    }

    #[test]
    fn auth_entries_are_defaulted_and_validated() {
        let mut registry = RegistryConfig {
            auths: Some(BTreeMap::from([(
                "registry.local:5000".to_owned(),
                RegistryAuth {
                    username: Some("admin".to_owned()),
                    password: Some("secret".to_owned()),
                    ..RegistryAuth::default()
                },
            )])),
            ..RegistryConfig::default()
        };
        registry.apply_defaults();

        let auth = registry
            .auths
            .as_ref()
            .and_then(|auths| auths.get("registry.local:5000"))
            .expect("auth entry");
        assert_eq!(auth.skip_tls_verify, Some(false));
        assert_eq!(auth.plain_http, Some(false));

        let mut errors = ValidationErrors::new();
        registry.validate_at("spec.registry", &mut errors);
        assert!(errors.is_empty(), "unexpected errors:\n{errors}");
    }

    #[test]
    fn invalid_registry_values_are_reported_with_full_paths() {
        let registry = RegistryConfig {
            private_registry: Some("registry.local:".to_owned()),
            namespace_override: Some("kube forge".to_owned()),
            auths: Some(BTreeMap::from([(
                ":5000".to_owned(),
                RegistryAuth {
                    username: Some(" ".to_owned()),
                    ..RegistryAuth::default()
                },
            )])),
            registry_mirrors: Some(vec![String::new()]),
            insecure_registries: Some(vec!["registry.local:5000".to_owned(), "bad host".to_owned()]),
        };

        let mut errors = ValidationErrors::new();
        registry.validate_at("spec.registry", &mut errors);

        let paths = errors.iter().map(|error| error.path.as_str()).collect::<Vec<_>>();
        assert_eq!(paths, [
            "spec.registry.privateRegistry",
            "spec.registry.namespaceOverride",
            "spec.registry.auths[\":5000\"]",
            "spec.registry.auths[\":5000\"].username",
            "spec.registry.registryMirrors[0]",
            "spec.registry.insecureRegistries[1]",
        ]);
    }
}
