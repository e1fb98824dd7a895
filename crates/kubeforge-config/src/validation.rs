//! Semantic validators for scalar configuration values.
//!
//! These are pure, total predicates: for any string input they return a
//! boolean and never panic. Error wording is left to the callers, which know
//! the field path being checked.

use std::{
    net::{IpAddr, Ipv6Addr},
    sync::LazyLock,
};

use const_format::concatcp;
use regex::Regex;
use relaxed_version::Version;

/// A label as it may appear between the dots of a domain name.
const DOMAIN_LABEL_FMT: &str = "[a-zA-Z0-9]([-a-zA-Z0-9]*[a-zA-Z0-9])?";
const DOMAIN_FMT: &str = concatcp!(DOMAIN_LABEL_FMT, "(\\.", DOMAIN_LABEL_FMT, ")*");

/// A domain's max length in DNS (RFC 1123)
const DOMAIN_MAX_LENGTH: usize = 253;

static DOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{DOMAIN_FMT}$")).expect("failed to compile domain regex")
});

/// Tests for a port number, i.e. an all-digit string whose value lies in
/// `[1, 65535]`. Leading zeros are accepted as long as the value is in range.
pub fn is_valid_port(value: &str) -> bool {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    matches!(value.parse::<u64>(), Ok(port) if (1..=65535).contains(&port))
}

/// Tests for an IP address of either family.
pub fn is_valid_ip(value: &str) -> bool {
    value.parse::<IpAddr>().is_ok()
}

/// Tests for a domain name: dot-separated labels of letters, digits and
/// hyphens with no leading/trailing hyphen and no empty label. At least one
/// label must contain a non-digit, so that IP-like strings such as `1.2.3.4`
/// are not mistaken for domain names.
pub fn is_valid_domain(value: &str) -> bool {
    value.len() <= DOMAIN_MAX_LENGTH
        && DOMAIN_REGEX.is_match(value)
        && value
            .split('.')
            .any(|label| !label.bytes().all(|b| b.is_ascii_digit()))
}

/// Tests for a bare host, i.e. an IP address or a domain name.
pub fn is_valid_host(value: &str) -> bool {
    is_valid_ip(value) || is_valid_domain(value)
}

/// Tests for a host with an optional port.
///
/// Accepted shapes are a bare host (IP address or domain name), `host:port`,
/// and the bracketed IPv6 forms `[address]` and `[address]:port`. An IPv6
/// address with a port must be bracketed: an unbracketed multi-colon string
/// is only accepted when it is itself a well-formed IPv6 address (e.g.
/// `::1:8080`, which is an address, not host `::1` plus port `8080`).
/// `host:` and `:port` are rejected.
pub fn is_valid_host_port(value: &str) -> bool {
    if is_valid_ip(value) {
        return true;
    }

    if let Some(rest) = value.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((address, "")) => address.parse::<Ipv6Addr>().is_ok(),
            Some((address, suffix)) => match suffix.strip_prefix(':') {
                Some(port) => address.parse::<Ipv6Addr>().is_ok() && is_valid_port(port),
                None => false,
            },
            None => false,
        };
    }

    match value.bytes().filter(|b| *b == b':').count() {
        0 => is_valid_domain(value),
        1 => value
            .split_once(':')
            .is_some_and(|(host, port)| is_valid_host(host) && is_valid_port(port)),
        _ => false,
    }
}

/// Tests for CIDR notation: `address/prefix` with a syntactically valid
/// address and a prefix length that fits the address family.
pub fn is_valid_cidr(value: &str) -> bool {
    let Some((address, prefix)) = value.split_once('/') else {
        return false;
    };

    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let Ok(prefix) = prefix.parse::<u8>() else {
        return false;
    };

    match address.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => prefix <= 32,
        Ok(IpAddr::V6(_)) => prefix <= 128,
        Err(_) => false,
    }
}

/// Tests for the permissive version grammar, see [`relaxed_version`].
pub fn is_valid_version(value: &str) -> bool {
    value.parse::<Version>().is_ok()
}
