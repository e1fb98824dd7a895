//! Defaulting and validation for declarative Kubernetes cluster
//! specifications.
//!
//! A [`ClusterSpec`] is deserialized from YAML or JSON, completed with
//! [`ClusterSpec::apply_defaults`] and checked with
//! [`ClusterSpec::validate`]. Validation never stops at the first problem,
//! every violation is collected into a [`ValidationErrors`] list with the
//! dotted path of the offending field.

pub mod cluster;
pub mod errors;
pub mod validation;

pub use cluster::ClusterSpec;
pub use errors::{ValidationError, ValidationErrors};
