use std::fmt::Display;

use snafu::Snafu;

/// A single path-qualified problem discovered during validation.
///
/// The path is dotted and rooted at the prefix the caller passed to the
/// validation entry point, e.g. `spec.network.calico.ipipMode`.
#[derive(Clone, Debug, Eq, PartialEq, Snafu)]
#[snafu(display("{path}: {message}"))]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

/// An ordered collection of [`ValidationError`]s.
///
/// Errors are appended in discovery order (depth-first, field-declaration
/// order within a section) and are never deduplicated. Validation is
/// exhaustive rather than fail-fast, so a single pass over a tree surfaces
/// every defect at once.
#[derive(Debug, Default)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one error record. Never fails, never deduplicates.
    pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(ValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type IntoIter = std::slice::Iter<'a, ValidationError>;
    type Item = &'a ValidationError;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Renders the accumulated errors as the user-facing report, one error per
/// line, preserving insertion order.
impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Renders the path of a sequence element, e.g. `spec.system.ntpServers[0]`.
pub fn element_path(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}

/// Renders the path of a map entry, e.g. `spec.registry.auths["docker.io"]`.
pub fn key_path(path: &str, key: &str) -> String {
    format!("{path}[{key:?}]")
}
