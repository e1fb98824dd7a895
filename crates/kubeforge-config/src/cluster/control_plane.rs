use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    cluster::{
        inactive_variant_message, missing_variant_message, resolve_discriminator,
        validate_enum_value, validate_grammar,
    },
    errors::ValidationErrors,
    validation,
};

/// The supported internal load balancers for the control plane endpoint.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, strum::Display, strum::EnumString,
    strum::VariantNames,
)]
#[strum(serialize_all = "kebab-case")]
pub enum InternalLoadBalancer {
    #[default]
    Haproxy,
    KubeVip,
}

/// kube-vip advertisement modes.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, strum::Display, strum::EnumString,
    strum::VariantNames,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum KubeVipMode {
    #[default]
    Arp,
    Bgp,
}

const DEFAULT_ENDPOINT_DOMAIN: &str = "lb.kubeforge.local";
const DEFAULT_ENDPOINT_PORT: u16 = 6443;
const DEFAULT_HAPROXY_HEALTH_PORT: u16 = 8081;

/// The highly-available control plane endpoint.
///
/// `internalLoadbalancer` selects the load balancer deployed on worker nodes;
/// exactly one variant substructure matching it may be configured.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControlPlaneEndpoint {
    /// The domain name the cluster uses to reach its control plane. Defaults
    /// to `lb.kubeforge.local`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// The IP address behind the domain. Defaults to empty, meaning the
    /// address of the first control plane node is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// The port the API server is reachable on. Defaults to 6443.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Which internal load balancer to deploy, one of `haproxy` or
    /// `kube-vip`. Defaults to `haproxy`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_loadbalancer: Option<String>,

    /// HAProxy options, only valid when `internalLoadbalancer` is `haproxy`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub haproxy: Option<HaproxyConfig>,

    /// kube-vip options, only valid when `internalLoadbalancer` is
    /// `kube-vip`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubevip: Option<KubeVipConfig>,
}

impl ControlPlaneEndpoint {
    pub fn apply_defaults(&mut self) {
        self.domain
            .get_or_insert_with(|| DEFAULT_ENDPOINT_DOMAIN.to_owned());
        self.address.get_or_insert_default();
        self.port.get_or_insert(DEFAULT_ENDPOINT_PORT);

        let load_balancer = self
            .internal_loadbalancer
            .get_or_insert_with(|| InternalLoadBalancer::default().to_string())
            .clone();

        tracing::trace!(
            load_balancer = %load_balancer,
            "selected internal load balancer variant"
        );

        match load_balancer.parse::<InternalLoadBalancer>() {
            Ok(InternalLoadBalancer::Haproxy) => {
                self.haproxy.get_or_insert_default().apply_defaults();
            }
            Ok(InternalLoadBalancer::KubeVip) => {
                self.kubevip.get_or_insert_default().apply_defaults();
            }
            Err(_) => {}
        }
    }

    pub fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_grammar(
            self.domain.as_deref(),
            validation::is_valid_domain,
            "a valid domain name",
            format!("{path}.domain"),
            errors,
        );

        // An empty address is the documented default, a set one must be an IP
        if let Some(address) = self.address.as_deref() {
            if !address.is_empty() && !validation::is_valid_ip(address) {
                errors.add(
                    format!("{path}.address"),
                    format!("{address:?} is not a valid IP address"),
                );
            }
        }

        if self.port == Some(0) {
            errors.add(format!("{path}.port"), "0 is not in the range [1, 65535]");
        }

        let Some(active) = resolve_discriminator::<InternalLoadBalancer>(
            self.internal_loadbalancer.as_deref(),
            path,
            "internalLoadbalancer",
            errors,
        ) else {
            return;
        };

        match active {
            InternalLoadBalancer::Haproxy => match &self.haproxy {
                Some(haproxy) => haproxy.validate_at(&format!("{path}.haproxy"), errors),
                None => errors.add(
                    format!("{path}.haproxy"),
                    missing_variant_message("internalLoadbalancer", active),
                ),
            },
            InternalLoadBalancer::KubeVip => match &self.kubevip {
                Some(kubevip) => kubevip.validate_at(&format!("{path}.kubevip"), errors),
                None => errors.add(
                    format!("{path}.kubevip"),
                    missing_variant_message("internalLoadbalancer", active),
                ),
            },
        }

        // The kube-vip variant lives in the `kubevip` field while its
        // discriminator value is `kube-vip`
        for (variant, field, populated) in [
            (InternalLoadBalancer::Haproxy, "haproxy", self.haproxy.is_some()),
            (InternalLoadBalancer::KubeVip, "kubevip", self.kubevip.is_some()),
        ] {
            if variant != active && populated {
                errors.add(
                    format!("{path}.{field}"),
                    inactive_variant_message("internalLoadbalancer", active, variant),
                );
            }
        }
    }
}

/// HAProxy options.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HaproxyConfig {
    /// The port of the local health check endpoint. Defaults to 8081.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_port: Option<u16>,
}

impl HaproxyConfig {
    fn apply_defaults(&mut self) {
        self.health_port.get_or_insert(DEFAULT_HAPROXY_HEALTH_PORT);
    }

    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        if self.health_port == Some(0) {
            errors.add(
                format!("{path}.healthPort"),
                "0 is not in the range [1, 65535]",
            );
        }
    }
}

/// kube-vip options.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KubeVipConfig {
    /// The virtual IP address announced by kube-vip. Must be provided, there
    /// is no sensible default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vip: Option<String>,

    /// The advertisement mode, one of `ARP` or `BGP`. Defaults to `ARP`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl KubeVipConfig {
    fn apply_defaults(&mut self) {
        // vip has no default, a virtual IP cannot be invented
        self.mode.get_or_insert_with(|| KubeVipMode::default().to_string());
    }

    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        match self.vip.as_deref() {
            Some(vip) if !validation::is_valid_ip(vip) => {
                errors.add(
                    format!("{path}.vip"),
                    format!("{vip:?} is not a valid IP address"),
                );
            }
            Some(_) => {}
            None => errors.add(format!("{path}.vip"), "field is required"),
        }

        validate_enum_value::<KubeVipMode>(self.mode.as_deref(), format!("{path}.mode"), errors);
    }
}
