use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    cluster::{
        inactive_variant_message, missing_variant_message, resolve_discriminator,
        validate_enum_value, validate_grammar, validate_range,
    },
    errors::ValidationErrors,
    validation,
};

/// The supported network plugins.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, strum::Display, strum::EnumString,
    strum::VariantNames,
)]
#[strum(serialize_all = "lowercase")]
pub enum NetworkPlugin {
    #[default]
    Calico,
    Flannel,
    Cilium,
    Kubeovn,
}

/// Calico overlay encapsulation modes, shared by `ipipMode` and `vxlanMode`.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, strum::Display, strum::EnumString, strum::VariantNames,
)]
pub enum EncapsulationMode {
    Always,
    CrossSubnet,
    Never,
}

/// Flannel backend modes.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, strum::Display, strum::EnumString,
    strum::VariantNames,
)]
#[strum(serialize_all = "kebab-case")]
pub enum FlannelBackend {
    #[default]
    Vxlan,
    HostGw,
}

/// Cilium tunneling modes.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, strum::Display, strum::EnumString,
    strum::VariantNames,
)]
#[strum(serialize_all = "lowercase")]
pub enum CiliumTunnelMode {
    #[default]
    Vxlan,
    Geneve,
    Disabled,
}

/// Kube-OVN tunnel types.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, strum::Display, strum::EnumString,
    strum::VariantNames,
)]
#[strum(serialize_all = "lowercase")]
pub enum KubeovnTunnelType {
    #[default]
    Geneve,
    Vxlan,
    Stt,
}

const DEFAULT_PODS_CIDR: &str = "10.233.64.0/18";
const DEFAULT_SERVICE_CIDR: &str = "10.233.0.0/18";
const DEFAULT_KUBEOVN_JOIN_CIDR: &str = "100.64.0.0/16";
const MAX_VETH_MTU: u32 = 9000;

/// Cluster networking.
///
/// `plugin` selects the network plugin; exactly one variant substructure
/// matching it may be configured.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkConfig {
    /// Which network plugin to deploy, one of `calico`, `flannel`, `cilium`
    /// or `kubeovn`. Defaults to `calico`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,

    /// The CIDR allocated to pods. Defaults to `10.233.64.0/18`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pods_cidr: Option<String>,

    /// The CIDR allocated to cluster services. Defaults to `10.233.0.0/18`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_cidr: Option<String>,

    /// Calico options, only valid when `plugin` is `calico`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calico: Option<CalicoConfig>,

    /// Flannel options, only valid when `plugin` is `flannel`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flannel: Option<FlannelConfig>,

    /// Cilium options, only valid when `plugin` is `cilium`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cilium: Option<CiliumConfig>,

    /// Kube-OVN options, only valid when `plugin` is `kubeovn`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubeovn: Option<KubeovnConfig>,
}

impl NetworkConfig {
    pub fn apply_defaults(&mut self) {
        let plugin = self
            .plugin
            .get_or_insert_with(|| NetworkPlugin::default().to_string())
            .clone();
        self.pods_cidr
            .get_or_insert_with(|| DEFAULT_PODS_CIDR.to_owned());
        self.service_cidr
            .get_or_insert_with(|| DEFAULT_SERVICE_CIDR.to_owned());

        tracing::trace!(plugin = %plugin, "selected network plugin variant");

        match plugin.parse::<NetworkPlugin>() {
            Ok(NetworkPlugin::Calico) => self.calico.get_or_insert_default().apply_defaults(),
            Ok(NetworkPlugin::Flannel) => self.flannel.get_or_insert_default().apply_defaults(),
            Ok(NetworkPlugin::Cilium) => self.cilium.get_or_insert_default().apply_defaults(),
            Ok(NetworkPlugin::Kubeovn) => self.kubeovn.get_or_insert_default().apply_defaults(),
            Err(_) => {}
        }
    }

    pub fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        let active = resolve_discriminator::<NetworkPlugin>(
            self.plugin.as_deref(),
            path,
            "plugin",
            errors,
        );

        validate_grammar(
            self.pods_cidr.as_deref(),
            validation::is_valid_cidr,
            "a valid CIDR",
            format!("{path}.podsCidr"),
            errors,
        );
        validate_grammar(
            self.service_cidr.as_deref(),
            validation::is_valid_cidr,
            "a valid CIDR",
            format!("{path}.serviceCidr"),
            errors,
        );

        let Some(active) = active else {
            return;
        };

        match active {
            NetworkPlugin::Calico => match &self.calico {
                Some(calico) => calico.validate_at(&format!("{path}.calico"), errors),
                None => errors.add(
                    format!("{path}.calico"),
                    missing_variant_message("plugin", active),
                ),
            },
            NetworkPlugin::Flannel => match &self.flannel {
                Some(flannel) => flannel.validate_at(&format!("{path}.flannel"), errors),
                None => errors.add(
                    format!("{path}.flannel"),
                    missing_variant_message("plugin", active),
                ),
            },
            NetworkPlugin::Cilium => match &self.cilium {
                Some(cilium) => cilium.validate_at(&format!("{path}.cilium"), errors),
                None => errors.add(
                    format!("{path}.cilium"),
                    missing_variant_message("plugin", active),
                ),
            },
            NetworkPlugin::Kubeovn => match &self.kubeovn {
                Some(kubeovn) => kubeovn.validate_at(&format!("{path}.kubeovn"), errors),
                None => errors.add(
                    format!("{path}.kubeovn"),
                    missing_variant_message("plugin", active),
                ),
            },
        }

        for (variant, populated) in [
            (NetworkPlugin::Calico, self.calico.is_some()),
            (NetworkPlugin::Flannel, self.flannel.is_some()),
            (NetworkPlugin::Cilium, self.cilium.is_some()),
            (NetworkPlugin::Kubeovn, self.kubeovn.is_some()),
        ] {
            if variant != active && populated {
                errors.add(
                    format!("{path}.{variant}"),
                    inactive_variant_message("plugin", active, variant),
                );
            }
        }
    }
}

/// Calico options.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalicoConfig {
    /// IP-in-IP encapsulation mode, one of `Always`, `CrossSubnet` or
    /// `Never`. Defaults to `Always`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipip_mode: Option<String>,

    /// VXLAN encapsulation mode, one of `Always`, `CrossSubnet` or `Never`.
    /// Defaults to `Never`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vxlan_mode: Option<String>,

    /// The MTU of the veth interfaces, 0 for auto-detection. Defaults to 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub veth_mtu: Option<u32>,
}

impl CalicoConfig {
    fn apply_defaults(&mut self) {
        self.ipip_mode
            .get_or_insert_with(|| EncapsulationMode::Always.to_string());
        self.vxlan_mode
            .get_or_insert_with(|| EncapsulationMode::Never.to_string());
        self.veth_mtu.get_or_insert(0);
    }

    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_enum_value::<EncapsulationMode>(
            self.ipip_mode.as_deref(),
            format!("{path}.ipipMode"),
            errors,
        );
        validate_enum_value::<EncapsulationMode>(
            self.vxlan_mode.as_deref(),
            format!("{path}.vxlanMode"),
            errors,
        );
        validate_range(
            self.veth_mtu,
            0,
            MAX_VETH_MTU,
            format!("{path}.vethMtu"),
            errors,
        );
    }
}

/// Flannel options.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlannelConfig {
    /// The backend mode, one of `vxlan` or `host-gw`. Defaults to `vxlan`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_mode: Option<String>,
}

impl FlannelConfig {
    fn apply_defaults(&mut self) {
        self.backend_mode
            .get_or_insert_with(|| FlannelBackend::default().to_string());
    }

    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_enum_value::<FlannelBackend>(
            self.backend_mode.as_deref(),
            format!("{path}.backendMode"),
            errors,
        );
    }
}

/// Cilium options.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CiliumConfig {
    /// The tunneling mode, one of `vxlan`, `geneve` or `disabled`. Defaults
    /// to `vxlan`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tunnel_mode: Option<String>,

    /// Whether traffic leaving the cluster is masqueraded. Defaults to true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_masquerade: Option<bool>,
}

impl CiliumConfig {
    fn apply_defaults(&mut self) {
        self.tunnel_mode
            .get_or_insert_with(|| CiliumTunnelMode::default().to_string());
        self.enable_masquerade.get_or_insert(true);
    }

    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_enum_value::<CiliumTunnelMode>(
            self.tunnel_mode.as_deref(),
            format!("{path}.tunnelMode"),
            errors,
        );
    }
}

/// Kube-OVN options.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KubeovnConfig {
    /// The CIDR of the join subnet connecting nodes to the OVN network.
    /// Defaults to `100.64.0.0/16`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_cidr: Option<String>,

    /// The tunnel type, one of `geneve`, `vxlan` or `stt`. Defaults to
    /// `geneve`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tunnel_type: Option<String>,
}

impl KubeovnConfig {
    fn apply_defaults(&mut self) {
        self.join_cidr
            .get_or_insert_with(|| DEFAULT_KUBEOVN_JOIN_CIDR.to_owned());
        self.tunnel_type
            .get_or_insert_with(|| KubeovnTunnelType::default().to_string());
    }

    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_grammar(
            self.join_cidr.as_deref(),
            validation::is_valid_cidr,
            "a valid CIDR",
            format!("{path}.joinCidr"),
            errors,
        );
        validate_enum_value::<KubeovnTunnelType>(
            self.tunnel_type.as_deref(),
            format!("{path}.tunnelType"),
            errors,
        );
    }
}
