use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    cluster::{
        inactive_variant_message, missing_variant_message, resolve_discriminator,
        validate_entries, validate_entries_non_blank, validate_enum_value, validate_grammar,
        validate_non_blank,
    },
    errors::{ValidationErrors, key_path},
    validation,
};

/// The supported container runtimes.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, strum::Display, strum::EnumString,
    strum::VariantNames,
)]
#[strum(serialize_all = "lowercase")]
pub enum ContainerRuntime {
    Docker,
    #[default]
    Containerd,
    Crio,
    Isula,
}

/// The supported cgroup drivers for runtimes that take one.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, strum::Display, strum::EnumString,
    strum::VariantNames,
)]
#[strum(serialize_all = "lowercase")]
pub enum CgroupDriver {
    #[default]
    Systemd,
    Cgroupfs,
}

const DEFAULT_DOCKER_DATA_ROOT: &str = "/var/lib/docker";
const DEFAULT_CONTAINERD_DATA_ROOT: &str = "/var/lib/containerd";
const DEFAULT_CRIO_DATA_ROOT: &str = "/var/lib/containers/storage";
const DEFAULT_ISULA_DATA_ROOT: &str = "/var/lib/isulad";
const DEFAULT_SANDBOX_IMAGE: &str = "registry.k8s.io/pause:3.9";
const DEFAULT_CRIO_PIDS_LIMIT: i64 = 1024;

/// Container runtime settings.
///
/// `type` selects the runtime; exactly one variant substructure matching it
/// may be configured. The others must be left unset.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerRuntimeConfig {
    /// Which container runtime to install, one of `docker`, `containerd`,
    /// `crio` or `isula`. Defaults to `containerd`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub runtime_type: Option<String>,

    /// Docker options, only valid when `type` is `docker`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker: Option<DockerConfig>,

    /// containerd options, only valid when `type` is `containerd`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub containerd: Option<ContainerdConfig>,

    /// CRI-O options, only valid when `type` is `crio`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crio: Option<CrioConfig>,

    /// iSulad options, only valid when `type` is `isula`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isula: Option<IsulaConfig>,
}

impl ContainerRuntimeConfig {
    pub fn apply_defaults(&mut self) {
        let runtime_type = self
            .runtime_type
            .get_or_insert_with(|| ContainerRuntime::default().to_string())
            .clone();

        tracing::trace!(runtime = %runtime_type, "selected container runtime variant");

        // Only the active variant is instantiated. Populated non-active
        // variants are left alone for the validator to flag.
        match runtime_type.parse::<ContainerRuntime>() {
            Ok(ContainerRuntime::Docker) => self.docker.get_or_insert_default().apply_defaults(),
            Ok(ContainerRuntime::Containerd) => {
                self.containerd.get_or_insert_default().apply_defaults();
            }
            Ok(ContainerRuntime::Crio) => self.crio.get_or_insert_default().apply_defaults(),
            Ok(ContainerRuntime::Isula) => self.isula.get_or_insert_default().apply_defaults(),
            Err(_) => {}
        }
    }

    pub fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        let Some(active) = resolve_discriminator::<ContainerRuntime>(
            self.runtime_type.as_deref(),
            path,
            "type",
            errors,
        ) else {
            return;
        };

        match active {
            ContainerRuntime::Docker => match &self.docker {
                Some(docker) => docker.validate_at(&format!("{path}.docker"), errors),
                None => errors.add(
                    format!("{path}.docker"),
                    missing_variant_message("type", active),
                ),
            },
            ContainerRuntime::Containerd => match &self.containerd {
                Some(containerd) => containerd.validate_at(&format!("{path}.containerd"), errors),
                None => errors.add(
                    format!("{path}.containerd"),
                    missing_variant_message("type", active),
                ),
            },
            ContainerRuntime::Crio => match &self.crio {
                Some(crio) => crio.validate_at(&format!("{path}.crio"), errors),
                None => errors.add(
                    format!("{path}.crio"),
                    missing_variant_message("type", active),
                ),
            },
            ContainerRuntime::Isula => match &self.isula {
                Some(isula) => isula.validate_at(&format!("{path}.isula"), errors),
                None => errors.add(
                    format!("{path}.isula"),
                    missing_variant_message("type", active),
                ),
            },
        }

        // Mutual exclusivity, checked for every non-active variant
        for (variant, populated) in [
            (ContainerRuntime::Docker, self.docker.is_some()),
            (ContainerRuntime::Containerd, self.containerd.is_some()),
            (ContainerRuntime::Crio, self.crio.is_some()),
            (ContainerRuntime::Isula, self.isula.is_some()),
        ] {
            if variant != active && populated {
                errors.add(
                    format!("{path}.{variant}"),
                    inactive_variant_message("type", active, variant),
                );
            }
        }
    }
}

/// Docker daemon options.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DockerConfig {
    /// The Docker version to install. If not specified, the version packaged
    /// with the OS is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// The root directory of persisted Docker state. Defaults to
    /// `/var/lib/docker`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_root: Option<String>,

    /// The cgroup driver the daemon uses, `systemd` or `cgroupfs`. Defaults
    /// to `systemd`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cgroup_driver: Option<String>,

    /// Registry mirror URLs, in order of preference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_mirrors: Option<Vec<String>>,

    /// Registries the daemon may contact over plain HTTP or with unverified
    /// TLS, as `host` or `host:port`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure_registries: Option<Vec<String>>,
}

impl DockerConfig {
    fn apply_defaults(&mut self) {
        self.data_root
            .get_or_insert_with(|| DEFAULT_DOCKER_DATA_ROOT.to_owned());
        self.cgroup_driver
            .get_or_insert_with(|| CgroupDriver::default().to_string());
        self.registry_mirrors.get_or_insert_default();
        self.insecure_registries.get_or_insert_default();
    }

    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_grammar(
            self.version.as_deref(),
            validation::is_valid_version,
            "a valid version",
            format!("{path}.version"),
            errors,
        );
        validate_non_blank(self.data_root.as_deref(), format!("{path}.dataRoot"), errors);
        validate_enum_value::<CgroupDriver>(
            self.cgroup_driver.as_deref(),
            format!("{path}.cgroupDriver"),
            errors,
        );
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

/// containerd options.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerdConfig {
    /// The containerd version to install. If not specified, the version
    /// packaged with the OS is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// The root directory of persisted containerd state. Defaults to
    /// `/var/lib/containerd`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_root: Option<String>,

    /// The pause container image. Defaults to `registry.k8s.io/pause:3.9`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_image: Option<String>,

    /// Whether the runtime drives cgroups through systemd. Defaults to true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub systemd_cgroup: Option<bool>,

    /// Per-registry mirror endpoints, keyed by registry `host` or
    /// `host:port`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_mirrors: Option<BTreeMap<String, Vec<String>>>,

    /// Registries that may be contacted over plain HTTP or with unverified
    /// TLS, as `host` or `host:port`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure_registries: Option<Vec<String>>,
}

impl ContainerdConfig {
    fn apply_defaults(&mut self) {
        self.data_root
            .get_or_insert_with(|| DEFAULT_CONTAINERD_DATA_ROOT.to_owned());
        self.sandbox_image
            .get_or_insert_with(|| DEFAULT_SANDBOX_IMAGE.to_owned());
        self.systemd_cgroup.get_or_insert(true);
        self.registry_mirrors.get_or_insert_default();
        self.insecure_registries.get_or_insert_default();
    }

    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_grammar(
            self.version.as_deref(),
            validation::is_valid_version,
            "a valid version",
            format!("{path}.version"),
            errors,
        );
        validate_non_blank(self.data_root.as_deref(), format!("{path}.dataRoot"), errors);
        validate_non_blank(
            self.sandbox_image.as_deref(),
            format!("{path}.sandboxImage"),
            errors,
        );

        if let Some(mirrors) = &self.registry_mirrors {
            let mirrors_path = format!("{path}.registryMirrors");
            for (registry, endpoints) in mirrors {
                if !validation::is_valid_host_port(registry) {
                    errors.add(
                        key_path(&mirrors_path, registry),
                        format!("{registry:?} is not a valid host or host:port pair"),
                    );
                }
                validate_entries_non_blank(
                    Some(endpoints),
                    &key_path(&mirrors_path, registry),
                    errors,
                );
            }
        }

        validate_entries(
            self.insecure_registries.as_deref(),
            validation::is_valid_host_port,
            "a valid host or host:port pair",
            &format!("{path}.insecureRegistries"),
            errors,
        );
    }
}

/// CRI-O options.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CrioConfig {
    /// The CRI-O version to install. If not specified, the version packaged
    /// with the OS is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// The root directory of persisted container storage. Defaults to
    /// `/var/lib/containers/storage`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_root: Option<String>,

    /// The cgroup manager, `systemd` or `cgroupfs`. Defaults to `systemd`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cgroup_manager: Option<String>,

    /// The maximum number of processes per container, `-1` for unlimited.
    /// Defaults to 1024.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pids_limit: Option<i64>,
}

impl CrioConfig {
    fn apply_defaults(&mut self) {
        self.data_root
            .get_or_insert_with(|| DEFAULT_CRIO_DATA_ROOT.to_owned());
        self.cgroup_manager
            .get_or_insert_with(|| CgroupDriver::default().to_string());
        self.pids_limit.get_or_insert(DEFAULT_CRIO_PIDS_LIMIT);
    }

    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_grammar(
            self.version.as_deref(),
            validation::is_valid_version,
            "a valid version",
            format!("{path}.version"),
            errors,
        );
        validate_non_blank(self.data_root.as_deref(), format!("{path}.dataRoot"), errors);
        validate_enum_value::<CgroupDriver>(
            self.cgroup_manager.as_deref(),
            format!("{path}.cgroupManager"),
            errors,
        );
        if let Some(pids_limit) = self.pids_limit {
            // -1 means unlimited, 0 would disable container processes entirely
            if pids_limit == 0 || pids_limit < -1 || pids_limit > 65535 {
                errors.add(
                    format!("{path}.pidsLimit"),
                    format!("{pids_limit} is not -1 or in the range [1, 65535]"),
                );
            }
        }
    }
}

/// iSulad options.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IsulaConfig {
    /// The iSulad version to install. If not specified, the version packaged
    /// with the OS is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// The root directory of persisted iSulad state. Defaults to
    /// `/var/lib/isulad`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_root: Option<String>,

    /// Registry mirror URLs, in order of preference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_mirrors: Option<Vec<String>>,

    /// Registries that may be contacted over plain HTTP or with unverified
    /// TLS, as `host` or `host:port`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure_registries: Option<Vec<String>>,
}

impl IsulaConfig {
    fn apply_defaults(&mut self) {
        self.data_root
            .get_or_insert_with(|| DEFAULT_ISULA_DATA_ROOT.to_owned());
        self.registry_mirrors.get_or_insert_default();
        self.insecure_registries.get_or_insert_default();
    }

    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_grammar(
            self.version.as_deref(),
            validation::is_valid_version,
            "a valid version",
            format!("{path}.version"),
            errors,
        );
        validate_non_blank(self.data_root.as_deref(), format!("{path}.dataRoot"), errors);
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
