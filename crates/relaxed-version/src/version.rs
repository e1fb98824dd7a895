use std::{fmt::Display, num::ParseIntError, str::FromStr};

use snafu::{ResultExt, Snafu, ensure};

use crate::{Extension, ParseExtensionError};

/// Error variants which can be encountered when creating a new [`Version`]
/// from unparsed input.
#[derive(Debug, PartialEq, Snafu)]
pub enum ParseVersionError {
    #[snafu(display("version must not be empty"))]
    EmptyInput,

    #[snafu(display("release part contains an empty segment"))]
    EmptyReleaseSegment,

    #[snafu(display("release segment {segment:?} must be purely numeric"))]
    NonNumericReleaseSegment { segment: String },

    #[snafu(display("failed to parse release segment {segment:?} as a number"))]
    ParseReleaseSegment {
        source: ParseIntError,
        segment: String,
    },

    #[snafu(transparent)]
    ParseExtension { source: ParseExtensionError },
}

/// A permissive version with the `(v)<RELEASE>(-/+<EXTENSION>)` format, for
/// example `1.2.3`, `v1.6.0-beta.2` or `v1.21.5+k3s1-custom`.
///
/// The release part is dot-separated and purely numeric. Everything after the
/// first `-` or `+` is the extension part, see [`Extension`]. Note that this
/// is looser than strict SemVer (any number of release segments is allowed)
/// while rejecting shapes like `1.2.3a` where letters follow digits without a
/// separator.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Version {
    /// Whether the textual form carried a leading `v`.
    pub v_prefix: bool,

    /// The numeric release segments, e.g. `[1, 21, 5]` for `v1.21.5`.
    pub release: Vec<u64>,

    /// The optional pre-release or build metadata extension.
    pub extension: Option<Extension>,
}

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        ensure!(!input.is_empty(), EmptyInputSnafu);

        let (v_prefix, rest) = match input.strip_prefix('v') {
            Some(rest) => (true, rest),
            None => (false, input),
        };

        let (release_part, extension) = match rest.find(['-', '+']) {
            Some(index) => {
                let (release_part, extension_part) = rest.split_at(index);
                (release_part, Some(Extension::from_str(extension_part)?))
            }
            None => (rest, None),
        };

        let release = release_part
            .split('.')
            .map(|segment| {
                ensure!(!segment.is_empty(), EmptyReleaseSegmentSnafu);
                ensure!(
                    segment.bytes().all(|b| b.is_ascii_digit()),
                    NonNumericReleaseSegmentSnafu { segment }
                );
                segment
                    .parse::<u64>()
                    .context(ParseReleaseSegmentSnafu { segment })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            v_prefix,
            release,
            extension,
        })
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.v_prefix {
            f.write_str("v")?;
        }

        for (i, segment) in self.release.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }

        if let Some(extension) = &self.extension {
            write!(f, "{extension}")?;
        }

        Ok(())
    }
}

impl Version {
    /// Returns the release segment at `index`, if present. The major version
    /// is at index 0.
    pub fn release_segment(&self, index: usize) -> Option<u64> {
        self.release.get(index).copied()
    }

    /// Whether this version carries a `-` pre-release extension.
    pub fn is_pre_release(&self) -> bool {
        self.extension
            .as_ref()
            .is_some_and(|extension| extension.kind == crate::ExtensionKind::PreRelease)
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("1.2.3", false, &[1, 2, 3])]
    #[case("v1.2.3", true, &[1, 2, 3])]
    #[case("1.6.0-beta.2", false, &[1, 6, 0])]
    #[case("v1.21.5+k3s1-custom", true, &[1, 21, 5])]
    #[case("v1.18.20-eks-1-20-13", true, &[1, 18, 20])]
    #[case("1", false, &[1])]
    #[case("01.02", false, &[1, 2])]
    #[case("1.2.3.4.5", false, &[1, 2, 3, 4, 5])]
    fn valid_version(#[case] input: &str, #[case] v_prefix: bool, #[case] release: &[u64]) {
        let version = Version::from_str(input).expect("valid version");
        assert_eq!(version.v_prefix, v_prefix);
        assert_eq!(version.release, release);
    }

    #[rstest]
    #[case("1.2.3")]
    #[case("v1.2.3")]
    #[case("1.6.0-beta.2")]
    #[case("v1.21.5+k3s1-custom")]
    #[case("v1.18.20-eks-1-20-13")]
    fn display_round_trip(#[case] input: &str) {
        let version = Version::from_str(input).expect("valid version");
        assert_eq!(version.to_string(), input);
    }

    #[rstest]
    #[case("", ParseVersionError::EmptyInput)]
    #[case("v", ParseVersionError::EmptyReleaseSegment)]
    #[case("1..2", ParseVersionError::EmptyReleaseSegment)]
    #[case("1.2.", ParseVersionError::EmptyReleaseSegment)]
    #[case(".1.2", ParseVersionError::EmptyReleaseSegment)]
    #[case("1.2.3a", ParseVersionError::NonNumericReleaseSegment { segment: "3a".to_owned() })]
    #[case("1.20.3_beta", ParseVersionError::NonNumericReleaseSegment { segment: "3_beta".to_owned() })]
    #[case("vv1.2", ParseVersionError::NonNumericReleaseSegment { segment: "v1".to_owned() })]
    #[case("a.b.c", ParseVersionError::NonNumericReleaseSegment { segment: "a".to_owned() })]
    #[case("1.2.3-", ParseVersionError::ParseExtension { source: ParseExtensionError::Empty })]
    #[case("1.2.3-beta..2", ParseVersionError::ParseExtension { source: ParseExtensionError::EmptyIdentifier })]
    fn invalid_version(#[case] input: &str, #[case] error: ParseVersionError) {
        let err = Version::from_str(input).expect_err("invalid version");
        assert_eq!(err, error);
    }

    #[test]
    fn pre_release_detection() {
        let version = Version::from_str("1.6.0-beta.2").expect("valid version");
        assert!(version.is_pre_release());

        let version = Version::from_str("v1.21.5+k3s1").expect("valid version");
        assert!(!version.is_pre_release());

        assert_eq!(version.release_segment(0), Some(1));
        assert_eq!(version.release_segment(3), None);
    }
}
