use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    cluster::{
        inactive_variant_message, missing_variant_message, resolve_discriminator,
        validate_non_blank,
    },
    errors::ValidationErrors,
    validation,
};

/// The supported storage engines.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, strum::Display, strum::EnumString,
    strum::VariantNames,
)]
#[strum(serialize_all = "camelCase")]
pub enum StorageEngine {
    #[default]
    LocalVolume,
    NfsClient,
}

const DEFAULT_STORAGE_CLASS: &str = "local";

/// Cluster storage provisioning.
///
/// `type` selects the storage engine; exactly one variant substructure
/// matching it may be configured.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageConfig {
    /// Which storage engine to deploy, one of `localVolume` or `nfsClient`.
    /// Defaults to `localVolume`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,

    /// The name of the storage class marked as the cluster default.
    /// Defaults to `local`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_storage_class: Option<String>,

    /// Local volume provisioner options, only valid when `type` is
    /// `localVolume`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_volume: Option<LocalVolumeConfig>,

    /// NFS client provisioner options, only valid when `type` is
    /// `nfsClient`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nfs_client: Option<NfsClientConfig>,
}

impl StorageConfig {
    pub fn apply_defaults(&mut self) {
        let storage_type = self
            .storage_type
            .get_or_insert_with(|| StorageEngine::default().to_string())
            .clone();
        self.default_storage_class
            .get_or_insert_with(|| DEFAULT_STORAGE_CLASS.to_owned());

        tracing::trace!(engine = %storage_type, "selected storage engine variant");

        match storage_type.parse::<StorageEngine>() {
            Ok(StorageEngine::LocalVolume) => {
                self.local_volume.get_or_insert_default().apply_defaults();
            }
            Ok(StorageEngine::NfsClient) => {
                self.nfs_client.get_or_insert_default().apply_defaults();
            }
            Err(_) => {}
        }
    }

    pub fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        let active = resolve_discriminator::<StorageEngine>(
            self.storage_type.as_deref(),
            path,
            "type",
            errors,
        );

        validate_non_blank(
            self.default_storage_class.as_deref(),
            format!("{path}.defaultStorageClass"),
            errors,
        );

        let Some(active) = active else {
            return;
        };

        match active {
            StorageEngine::LocalVolume => match &self.local_volume {
                Some(local_volume) => {
                    local_volume.validate_at(&format!("{path}.localVolume"), errors);
                }
                None => errors.add(
                    format!("{path}.localVolume"),
                    missing_variant_message("type", active),
                ),
            },
            StorageEngine::NfsClient => match &self.nfs_client {
                Some(nfs_client) => nfs_client.validate_at(&format!("{path}.nfsClient"), errors),
                None => errors.add(
                    format!("{path}.nfsClient"),
                    missing_variant_message("type", active),
                ),
            },
        }

        for (variant, populated) in [
            (StorageEngine::LocalVolume, self.local_volume.is_some()),
            (StorageEngine::NfsClient, self.nfs_client.is_some()),
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

/// Local volume provisioner options.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocalVolumeConfig {
    /// The name of the storage class the provisioner serves. Defaults to
    /// `local`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
}

impl LocalVolumeConfig {
    fn apply_defaults(&mut self) {
        self.storage_class_name
            .get_or_insert_with(|| DEFAULT_STORAGE_CLASS.to_owned());
    }

    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_non_blank(
            self.storage_class_name.as_deref(),
            format!("{path}.storageClassName"),
            errors,
        );
    }
}

/// NFS client provisioner options.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NfsClientConfig {
    /// The NFS server, an IP address or domain name. Must be provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// The exported path on the NFS server. Must be provided and absolute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Whether removed volumes are archived instead of deleted. Defaults to
    /// false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_on_delete: Option<bool>,
}

impl NfsClientConfig {
    fn apply_defaults(&mut self) {
        // server and path have no defaults, they must come from the user
        self.archive_on_delete.get_or_insert(false);
    }

    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        match self.server.as_deref() {
            Some(server) if !validation::is_valid_host(server) => {
                errors.add(
                    format!("{path}.server"),
                    format!("{server:?} is not a valid IP address or domain name"),
                );
            }
            Some(_) => {}
            None => errors.add(format!("{path}.server"), "field is required"),
        }

        match self.path.as_deref() {
            Some(export) if export.trim().is_empty() => {
                errors.add(format!("{path}.path"), "must not be blank");
            }
            Some(export) if !export.starts_with('/') => {
                errors.add(
                    format!("{path}.path"),
                    format!("{export:?} is not an absolute path"),
                );
            }
            Some(_) => {}
            None => errors.add(format!("{path}.path"), "field is required"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_storage_defaults_to_local_volume() {
        let mut storage = StorageConfig::default();
        storage.apply_defaults();

        assert_eq!(storage.storage_type.as_deref(), Some("localVolume"));
        assert_eq!(storage.default_storage_class.as_deref(), Some("local"));
        assert_eq!(
            storage
                .local_volume
                .as_ref()
                .and_then(|local_volume| local_volume.storage_class_name.as_deref()),
            Some("local")
        );
        assert!(storage.nfs_client.is_none());

        let mut errors = ValidationErrors::new();
        storage.validate_at("spec.storage", &mut errors);
        assert!(errors.is_empty(), "unexpected errors:\n{errors}");
    }

    #[test]
    fn nfs_client_requires_server_and_path() {
        let mut storage = StorageConfig {
            storage_type: Some("nfsClient".to_owned()),
            ..StorageConfig::default()
        };
        storage.apply_defaults();

        let mut errors = ValidationErrors::new();
        storage.validate_at("spec.storage", &mut errors);

        let paths = errors.iter().map(|error| error.path.as_str()).collect::<Vec<_>>();
        assert_eq!(paths, ["spec.storage.nfsClient.server", "spec.storage.nfsClient.path"]);
    }

    #[test]
    fn nfs_path_must_be_absolute() {
        let nfs_client = NfsClientConfig {
            server: Some("nfs.internal".to_owned()),
            path: Some("exports/k8s".to_owned()),
            archive_on_delete: Some(false),
        };

        let mut errors = ValidationErrors::new();
        nfs_client.validate_at("spec.storage.nfsClient", &mut errors);

        assert_eq!(errors.len(), 1);
        let error = errors.iter().next().expect("one error");
        assert_eq!(error.path, "spec.storage.nfsClient.path");
        assert_eq!(error.message, "\"exports/k8s\" is not an absolute path");
    }

    #[test]
    fn populated_inactive_storage_variant_is_rejected() {
        let mut storage = StorageConfig {
            nfs_client: Some(NfsClientConfig {
                server: Some("nfs.internal".to_owned()),
                path: Some("/exports/k8s".to_owned()),
                archive_on_delete: None,
            }),
            ..StorageConfig::default()
        };
        storage.apply_defaults();

        let mut errors = ValidationErrors::new();
        storage.validate_at("spec.storage", &mut errors);

        assert_eq!(errors.len(), 1);
        let error = errors.iter().next().expect("one error");
        assert_eq!(error.path, "spec.storage.nfsClient");
        assert_eq!(
            error.message,
            "must not be set when type is 'localVolume' (can only be set if type is 'nfsClient')"
        );
    }
}
