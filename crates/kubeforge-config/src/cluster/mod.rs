//! The declarative cluster specification tree.
//!
//! Sections are deserialized sparsely: an absent field is `None`, never a
//! zero value. A tree is mutated exactly once by [`ClusterSpec::apply_defaults`]
//! (idempotent, in-place) and afterwards inspected read-only by
//! [`ClusterSpec::validate`], which accumulates every defect in one pass.

use std::{fmt::Display, str::FromStr};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::VariantNames;

mod control_plane;
mod kubernetes;
mod network;
mod registry;
mod runtime;
mod storage;
mod system;

pub use control_plane::*;
pub use kubernetes::*;
pub use network::*;
pub use registry::*;
pub use runtime::*;
pub use storage::*;
pub use system::*;

use crate::errors::{ValidationErrors, element_path};

/// The root of the cluster specification.
///
/// All sections are mandatory after defaulting; [`Self::apply_defaults`]
/// instantiates any that are absent, so a null section at validation time
/// means the defaulting pass was skipped.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Kubernetes core settings: version, kubelet and kube-proxy behavior.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubernetes: Option<KubernetesConfig>,

    /// Container runtime selection and per-runtime options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<ContainerRuntimeConfig>,

    /// Network plugin selection, cluster CIDRs and per-plugin options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkConfig>,

    /// The highly-available control plane endpoint and its internal load
    /// balancer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_plane_endpoint: Option<ControlPlaneEndpoint>,

    /// Storage engine selection and options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,

    /// Image registry access: private registry, mirrors and credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<RegistryConfig>,

    /// Operating system prerequisites applied to every node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemConfig>,
}

impl ClusterSpec {
    /// Fills in every unset field with its documented default, instantiating
    /// missing sections along the way.
    ///
    /// The pass is idempotent: every assignment is gated on the value being
    /// absent, so re-applying it to an already-defaulted tree is a fixed
    /// point and never overwrites an explicit user choice.
    pub fn apply_defaults(&mut self) {
        self.kubernetes.get_or_insert_default().apply_defaults();
        self.runtime.get_or_insert_default().apply_defaults();
        self.network.get_or_insert_default().apply_defaults();
        self.control_plane_endpoint
            .get_or_insert_default()
            .apply_defaults();
        self.storage.get_or_insert_default().apply_defaults();
        self.registry.get_or_insert_default().apply_defaults();
        self.system.get_or_insert_default().apply_defaults();

        tracing::debug!("applied cluster specification defaults");
    }

    /// Validates the (already defaulted) tree and returns every error found,
    /// with paths rooted at `path` (typically `"spec"`).
    pub fn validate(&self, path: &str) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        self.validate_at(path, &mut errors);

        tracing::debug!(
            error_count = errors.len(),
            "validated cluster specification"
        );
        errors
    }

    /// Walks all sections in declaration order, appending errors to `errors`.
    pub fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        match &self.kubernetes {
            Some(kubernetes) => kubernetes.validate_at(&format!("{path}.kubernetes"), errors),
            None => errors.add(format!("{path}.kubernetes"), "section is required"),
        }
        match &self.runtime {
            Some(runtime) => runtime.validate_at(&format!("{path}.runtime"), errors),
            None => errors.add(format!("{path}.runtime"), "section is required"),
        }
        match &self.network {
            Some(network) => network.validate_at(&format!("{path}.network"), errors),
            None => errors.add(format!("{path}.network"), "section is required"),
        }
        match &self.control_plane_endpoint {
            Some(endpoint) => {
                endpoint.validate_at(&format!("{path}.controlPlaneEndpoint"), errors);
            }
            None => errors.add(format!("{path}.controlPlaneEndpoint"), "section is required"),
        }
        match &self.storage {
            Some(storage) => storage.validate_at(&format!("{path}.storage"), errors),
            None => errors.add(format!("{path}.storage"), "section is required"),
        }
        match &self.registry {
            Some(registry) => registry.validate_at(&format!("{path}.registry"), errors),
            None => errors.add(format!("{path}.registry"), "section is required"),
        }
        match &self.system {
            Some(system) => system.validate_at(&format!("{path}.system"), errors),
            None => errors.add(format!("{path}.system"), "section is required"),
        }
    }
}

/// Re-derives the active variant of a discriminated section.
///
/// A missing or unrecognized discriminator value produces exactly one
/// structural error and suppresses the section's variant checks (no active
/// variant is derivable).
pub(crate) fn resolve_discriminator<E>(
    value: Option<&str>,
    path: &str,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<E>
where
    E: FromStr + VariantNames,
{
    let Some(value) = value else {
        errors.add(format!("{path}.{field}"), "field is required");
        return None;
    };

    match value.parse::<E>() {
        Ok(active) => Some(active),
        Err(_) => {
            errors.add(
                format!("{path}.{field}"),
                unknown_value_message(value, E::VARIANTS),
            );
            None
        }
    }
}

/// The error message for a populated variant substructure that does not match
/// the discriminator.
pub(crate) fn inactive_variant_message(
    discriminator: &str,
    active: impl Display,
    variant: impl Display,
) -> String {
    format!(
        "must not be set when {discriminator} is '{active}' (can only be set if {discriminator} is '{variant}')"
    )
}

/// The error message for an active variant substructure the Defaulting Engine
/// should have instantiated but did not.
pub(crate) fn missing_variant_message(discriminator: &str, active: impl Display) -> String {
    format!("section is required when {discriminator} is '{active}'")
}

fn unknown_value_message(value: &str, allowed: &[&str]) -> String {
    format!("{value:?} is not one of [{}]", allowed.join(", "))
}

/// Flags an enum-like string field whose value is outside its allowed set.
/// Absent fields are nothing to check.
pub(crate) fn validate_enum_value<E>(
    value: Option<&str>,
    path: String,
    errors: &mut ValidationErrors,
) where
    E: FromStr + VariantNames,
{
    if let Some(value) = value {
        if value.parse::<E>().is_err() {
            errors.add(path, unknown_value_message(value, E::VARIANTS));
        }
    }
}

/// Flags an optional scalar that was specified as blank or whitespace.
/// Absence is legal, a blank value is not.
pub(crate) fn validate_non_blank(
    value: Option<&str>,
    path: String,
    errors: &mut ValidationErrors,
) {
    if value.is_some_and(|value| value.trim().is_empty()) {
        errors.add(path, "must not be blank");
    }
}

/// Flags an optional scalar that fails the given grammar check, e.g.
/// `"10.0.0" is not a valid CIDR`.
pub(crate) fn validate_grammar(
    value: Option<&str>,
    check: fn(&str) -> bool,
    expected: &str,
    path: String,
    errors: &mut ValidationErrors,
) {
    if let Some(value) = value {
        if !check(value) {
            errors.add(path, format!("{value:?} is not {expected}"));
        }
    }
}

/// Flags a numeric field whose value lies outside `[min, max]`.
pub(crate) fn validate_range<T>(
    value: Option<T>,
    min: T,
    max: T,
    path: String,
    errors: &mut ValidationErrors,
) where
    T: PartialOrd + Display + Copy,
{
    if let Some(value) = value {
        if value < min || value > max {
            errors.add(path, format!("{value} is not in the range [{min}, {max}]"));
        }
    }
}

/// Checks every entry of an optional sequence against a grammar check,
/// reporting failures with `path[index]` paths.
pub(crate) fn validate_entries(
    entries: Option<&[String]>,
    check: fn(&str) -> bool,
    expected: &str,
    path: &str,
    errors: &mut ValidationErrors,
) {
    if let Some(entries) = entries {
        for (index, entry) in entries.iter().enumerate() {
            if !check(entry) {
                errors.add(
                    element_path(path, index),
                    format!("{entry:?} is not {expected}"),
                );
            }
        }
    }
}

/// Flags blank entries of an optional sequence with `path[index]` paths.
pub(crate) fn validate_entries_non_blank(
    entries: Option<&[String]>,
    path: &str,
    errors: &mut ValidationErrors,
) {
    if let Some(entries) = entries {
        for (index, entry) in entries.iter().enumerate() {
            if entry.trim().is_empty() {
                errors.add(element_path(path, index), "must not be blank");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaulting_is_idempotent() {
        let mut spec = ClusterSpec::default();
        spec.apply_defaults();

        let defaulted_once = spec.clone();
        spec.apply_defaults();
        assert_eq!(spec, defaulted_once);
    }

    #[test]
    fn defaulted_empty_spec_validates_clean() {
        let mut spec = ClusterSpec::default();
        spec.apply_defaults();

        let errors = spec.validate("spec");
        assert!(errors.is_empty(), "unexpected errors:\n{errors}");
    }

    #[test]
    fn missing_sections_are_structural_errors() {
        let spec = ClusterSpec::default();
        let errors = spec.validate("spec");

        // One error per mandatory section, no descent into any of them
        assert_eq!(errors.len(), 7);
        let paths = errors.iter().map(|error| error.path.clone()).collect::<Vec<_>>();
        assert_eq!(paths, [
            "spec.kubernetes",
            "spec.runtime",
            "spec.network",
            "spec.controlPlaneEndpoint",
            "spec.storage",
            "spec.registry",
            "spec.system",
        ]);
        for error in &errors {
            assert_eq!(error.message, "section is required");
        }
    }

    #[test]
    fn defaulting_keeps_explicit_values() {
        let mut spec = ClusterSpec {
            kubernetes: Some(KubernetesConfig {
                version: Some("v1.27.0".to_owned()),
                ..KubernetesConfig::default()
            }),
            ..ClusterSpec::default()
        };
        spec.apply_defaults();

        let kubernetes = spec.kubernetes.as_ref().expect("defaulted section");
        assert_eq!(kubernetes.version.as_deref(), Some("v1.27.0"));
        // Untouched siblings still get their defaults
        assert_eq!(kubernetes.proxy_mode.as_deref(), Some("ipvs"));
    }
}
