use std::{fmt::Display, str::FromStr};

use snafu::{Snafu, ensure};

/// Error variants which can be encountered when creating a new [`Extension`]
/// from unparsed input.
#[derive(Debug, PartialEq, Snafu)]
pub enum ParseExtensionError {
    #[snafu(display("extension must start with '-' or '+'"))]
    MissingSeparator,

    #[snafu(display("extension must contain at least one identifier"))]
    Empty,

    #[snafu(display("extension contains an empty identifier"))]
    EmptyIdentifier,

    #[snafu(display(
        "invalid extension identifier {identifier:?}, identifiers must be alphanumeric with internal hyphens"
    ))]
    InvalidIdentifier { identifier: String },
}

/// Whether an [`Extension`] was introduced by a `-` (pre-release) or a `+`
/// (build metadata) separator.
///
/// The grammar treats both kinds identically, the kind is only retained so
/// that the textual form can be reconstructed.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ExtensionKind {
    PreRelease,
    Build,
}

impl ExtensionKind {
    /// The separator character introducing this kind of extension.
    pub const fn separator(self) -> char {
        match self {
            Self::PreRelease => '-',
            Self::Build => '+',
        }
    }
}

/// The extension part of a [`Version`](crate::Version), e.g. the `beta.2` in
/// `1.6.0-beta.2` or the `k3s1-custom` in `v1.21.5+k3s1-custom`.
///
/// Identifiers are separated by dots. Each identifier must be non-empty and
/// consist of ASCII alphanumeric characters and hyphens, with no leading,
/// trailing or doubled hyphen.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Extension {
    pub kind: ExtensionKind,
    pub identifiers: Vec<String>,
}

impl FromStr for Extension {
    type Err = ParseExtensionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (kind, identifiers) = if let Some(rest) = input.strip_prefix('-') {
            (ExtensionKind::PreRelease, rest)
        } else if let Some(rest) = input.strip_prefix('+') {
            (ExtensionKind::Build, rest)
        } else {
            return MissingSeparatorSnafu.fail();
        };

        ensure!(!identifiers.is_empty(), EmptySnafu);

        let identifiers = identifiers
            .split('.')
            .map(|identifier| {
                ensure!(!identifier.is_empty(), EmptyIdentifierSnafu);
                ensure!(is_valid_identifier(identifier), InvalidIdentifierSnafu {
                    identifier
                });
                Ok(identifier.to_owned())
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { kind, identifiers })
    }
}

fn is_valid_identifier(identifier: &str) -> bool {
    identifier
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-')
        && !identifier.starts_with('-')
        && !identifier.ends_with('-')
        && !identifier.contains("--")
}

impl Display for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.kind.separator(), self.identifiers.join("."))
    }
}
