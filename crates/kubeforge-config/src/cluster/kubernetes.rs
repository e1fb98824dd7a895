use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    cluster::{validate_enum_value, validate_grammar, validate_range},
    errors::{ValidationErrors, key_path},
    validation,
};

/// The supported kube-proxy modes.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, strum::Display, strum::EnumString,
    strum::VariantNames,
)]
#[strum(serialize_all = "lowercase")]
pub enum ProxyMode {
    #[default]
    Ipvs,
    Iptables,
}

const DEFAULT_KUBERNETES_VERSION: &str = "v1.28.2";
const DEFAULT_CLUSTER_NAME: &str = "cluster.local";
const DEFAULT_DNS_DOMAIN: &str = "cluster.local";
const DEFAULT_MAX_PODS: u32 = 110;
const MIN_MAX_PODS: u32 = 10;
const MAX_MAX_PODS: u32 = 500;
const DEFAULT_NODE_CIDR_MASK_SIZE: u32 = 24;
const MIN_NODE_CIDR_MASK_SIZE: u32 = 8;
const MAX_NODE_CIDR_MASK_SIZE: u32 = 30;

/// Kubernetes core settings shared by the kubelet, kube-proxy and the
/// control plane.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KubernetesConfig {
    /// The Kubernetes version to install. Defaults to `v1.28.2`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// The name of the cluster. Defaults to `cluster.local`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,

    /// The DNS domain services are resolved under. Defaults to
    /// `cluster.local`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_domain: Option<String>,

    /// The kube-proxy mode, one of `ipvs` or `iptables`. Defaults to `ipvs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_mode: Option<String>,

    /// The maximum number of pods per node. Defaults to 110.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pods: Option<u32>,

    /// The size of the per-node pod CIDR mask. Defaults to 24.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_cidr_mask_size: Option<u32>,

    /// Whether control plane certificates are renewed automatically.
    /// Defaults to true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_renew_certs: Option<bool>,

    /// Kubernetes feature gates passed to all components.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_gates: Option<BTreeMap<String, bool>>,
}

impl KubernetesConfig {
    pub fn apply_defaults(&mut self) {
        self.version
            .get_or_insert_with(|| DEFAULT_KUBERNETES_VERSION.to_owned());
        self.cluster_name
            .get_or_insert_with(|| DEFAULT_CLUSTER_NAME.to_owned());
        self.dns_domain
            .get_or_insert_with(|| DEFAULT_DNS_DOMAIN.to_owned());
        self.proxy_mode
            .get_or_insert_with(|| ProxyMode::default().to_string());
        self.max_pods.get_or_insert(DEFAULT_MAX_PODS);
        self.node_cidr_mask_size
            .get_or_insert(DEFAULT_NODE_CIDR_MASK_SIZE);
        self.auto_renew_certs.get_or_insert(true);
        self.feature_gates.get_or_insert_default();
    }

    pub fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_grammar(
            self.version.as_deref(),
            validation::is_valid_version,
            "a valid version",
            format!("{path}.version"),
            errors,
        );
        validate_grammar(
            self.cluster_name.as_deref(),
            validation::is_valid_domain,
            "a valid domain name",
            format!("{path}.clusterName"),
            errors,
        );
        validate_grammar(
            self.dns_domain.as_deref(),
            validation::is_valid_domain,
            "a valid domain name",
            format!("{path}.dnsDomain"),
            errors,
        );
        validate_enum_value::<ProxyMode>(
            self.proxy_mode.as_deref(),
            format!("{path}.proxyMode"),
            errors,
        );
        validate_range(
            self.max_pods,
            MIN_MAX_PODS,
            MAX_MAX_PODS,
            format!("{path}.maxPods"),
            errors,
        );
        validate_range(
            self.node_cidr_mask_size,
            MIN_NODE_CIDR_MASK_SIZE,
            MAX_NODE_CIDR_MASK_SIZE,
            format!("{path}.nodeCidrMaskSize"),
            errors,
        );

        if let Some(feature_gates) = &self.feature_gates {
            let gates_path = format!("{path}.featureGates");
            for gate in feature_gates.keys() {
                if gate.trim().is_empty() {
                    errors.add(key_path(&gates_path, gate), "must not be blank");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn empty_kubernetes_config_defaults() {
        let mut kubernetes = KubernetesConfig::default();
        kubernetes.apply_defaults();

        assert_eq!(kubernetes.version.as_deref(), Some(DEFAULT_KUBERNETES_VERSION));
        assert_eq!(kubernetes.proxy_mode.as_deref(), Some("ipvs"));
        assert_eq!(kubernetes.max_pods, Some(DEFAULT_MAX_PODS));
        assert_eq!(kubernetes.auto_renew_certs, Some(true));
        assert_eq!(kubernetes.feature_gates, Some(BTreeMap::new()));

        let mut errors = ValidationErrors::new();
        kubernetes.validate_at("spec.kubernetes", &mut errors);
        assert!(errors.is_empty(), "unexpected errors:\n{errors}");
    }

    #[rstest]
    #[case("v1.28.2")]
    #[case("1.28.2")]
    #[case("v1.21.5+k3s1")]
    #[case("v1.18.20-eks-1-20-13")]
    fn accepted_versions(#[case] version: &str) {
        let kubernetes = KubernetesConfig {
            version: Some(version.to_owned()),
            ..KubernetesConfig::default()
        };

        let mut errors = ValidationErrors::new();
        kubernetes.validate_at("spec.kubernetes", &mut errors);
        assert!(errors.is_empty(), "unexpected errors:\n{errors}");
    }

    #[rstest]
    #[case("")]
    #[case("v")]
    #[case("1.28.2a")]
    #[case("1.28_2")]
    fn rejected_versions(#[case] version: &str) {
        let kubernetes = KubernetesConfig {
            version: Some(version.to_owned()),
            ..KubernetesConfig::default()
        };

        let mut errors = ValidationErrors::new();
        kubernetes.validate_at("spec.kubernetes", &mut errors);

        assert_eq!(errors.len(), 1);
        let error = errors.iter().next().expect("one error");
        assert_eq!(error.path, "spec.kubernetes.version");
        assert!(error.message.ends_with("is not a valid version"));
    }

    #[test]
    fn out_of_range_values_are_reported() {
        let kubernetes = KubernetesConfig {
            proxy_mode: Some("userspace".to_owned()),
            max_pods: Some(1000),
            node_cidr_mask_size: Some(31),
            ..KubernetesConfig::default()
        };

        let mut errors = ValidationErrors::new();
        kubernetes.validate_at("spec.kubernetes", &mut errors);

        let rendered = errors.to_string();
        assert_eq!(errors.len(), 3);
        assert!(rendered.contains("spec.kubernetes.proxyMode: \"userspace\" is not one of [ipvs, iptables]"));
        assert!(rendered.contains("spec.kubernetes.maxPods: 1000 is not in the range [10, 500]"));
        assert!(rendered.contains("spec.kubernetes.nodeCidrMaskSize: 31 is not in the range [8, 30]"));
    }

    #[test]
    fn blank_feature_gate_keys_are_rejected() {
        let kubernetes = KubernetesConfig {
            feature_gates: Some(BTreeMap::from([
                (String::new(), true),
                ("EphemeralContainers".to_owned(), true),
            ])),
            ..KubernetesConfig::default()
        };

        let mut errors = ValidationErrors::new();
        kubernetes.validate_at("spec.kubernetes", &mut errors);

        assert_eq!(errors.len(), 1);
        let error = errors.iter().next().expect("one error");
        assert_eq!(error.path, "spec.kubernetes.featureGates[\"\"]");
        assert_eq!(error.message, "must not be blank");
    }
}
