//! This library provides a validated, permissive version definition as it
//! commonly appears in cluster specifications. Versions consist of an optional
//! `v` prefix, a mandatory dot-separated numeric release part and an optional
//! extension part carrying pre-release or build metadata. The format can be
//! described by `(v)<RELEASE>(-/+<EXTENSION>)`, which is deliberately looser
//! than strict SemVer: `v1.21.5+k3s1-custom` and `v1.18.20-eks-1-20-13` are
//! both accepted.
//!
//! ## Usage
//!
//! Versions can be parsed and validated from [`str`] using Rust's standard
//! [`FromStr`](std::str::FromStr) trait.
//!
//! ```
//! # use std::str::FromStr;
//! use relaxed_version::Version;
//!
//! let version = Version::from_str("v1.6.0-beta.2")
//!     .expect("valid version");
//!
//! // Or using .parse()
//! let version: Version = "v1.6.0-beta.2".parse()
//!     .expect("valid version");
//!
//! assert_eq!(version.to_string(), "v1.6.0-beta.2");
//! ```

mod extension;
mod version;

pub use extension::*;
pub use version::*;
