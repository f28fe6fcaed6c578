//! Server identity check that accepts wildcard certificates.
//!
//! # Design
//! The check only looks at the `subjectAltName` text of the peer certificate
//! (`DNS:a.example.com, DNS:*.example.com, IP Address:...`). It never touches
//! the chain of trust; it decides whether a certificate that is otherwise
//! valid names `host`.
//!
//! The historical wildcard rule is a position test: `*.example.com` accepts
//! any longer host whose first `example.com` sits at its end, including
//! `fooexample.com`.
//! That rule is kept as [`WildcardPolicy::Suffix`] so existing callers see no
//! change; [`WildcardPolicy::LabelBoundary`] additionally requires a `.`
//! right before the matched domain.

use thiserror::Error;

/// Message returned for every rejected certificate.
pub const IDENTITY_FAILURE: &str = "Server certificate validation failed";

/// The parts of a peer certificate the identity check reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerCertificate {
    pub subject_alt_name: Option<String>,
}

impl PeerCertificate {
    pub fn new(subject_alt_name: impl Into<String>) -> Self {
        Self {
            subject_alt_name: Some(subject_alt_name.into()),
        }
    }
}

/// How a `*.domain` alternative name is matched against a host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WildcardPolicy {
    /// The first occurrence of `domain` in the host has to sit at its tail.
    /// A host repeating the domain, like `example.com.example.com`, is
    /// therefore rejected for `*.example.com`.
    #[default]
    Suffix,
    /// The host has to end with `.domain`.
    LabelBoundary,
}

/// The certificate does not name the requested host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", IDENTITY_FAILURE)]
pub struct IdentityError;

/// Check `host` against the certificate's DNS alternative names using
/// [`WildcardPolicy::Suffix`].
pub fn check_server_identity(host: &str, certificate: &PeerCertificate) -> Result<(), IdentityError> {
    check_server_identity_with(host, certificate, WildcardPolicy::Suffix)
}

/// Check `host` against the certificate's DNS alternative names.
///
/// An exact match on any name wins first; wildcard names are then tried in
/// the order they are listed.
pub fn check_server_identity_with(
    host: &str,
    certificate: &PeerCertificate,
    policy: WildcardPolicy,
) -> Result<(), IdentityError> {
    let alt_names = certificate.subject_alt_name.as_deref().ok_or(IdentityError)?;
    let dns_names: Vec<&str> = dns_names(alt_names).collect();
    if dns_names.is_empty() {
        return Err(IdentityError);
    }

    if dns_names.iter().any(|name| *name == host) {
        return Ok(());
    }

    let wildcard_match = dns_names
        .iter()
        .filter_map(|name| name.strip_prefix("*."))
        .any(|domain| matches_wildcard(host, domain, policy));
    if wildcard_match {
        Ok(())
    } else {
        Err(IdentityError)
    }
}

/// Values of the `DNS:` entries of a comma separated alternative name list.
fn dns_names(alt_names: &str) -> impl Iterator<Item = &str> {
    alt_names
        .split(',')
        .filter_map(|entry| entry.find("DNS:").map(|at| &entry[at + 4..]))
        .filter(|name| !name.is_empty())
}

/// `host` has to be strictly longer than `domain`, so a wildcard never
/// covers its own base domain.
fn matches_wildcard(host: &str, domain: &str, policy: WildcardPolicy) -> bool {
    if domain.is_empty() || host.len() <= domain.len() {
        return false;
    }
    let tail = host.len() - domain.len();
    match policy {
        WildcardPolicy::Suffix => host.find(domain) == Some(tail),
        WildcardPolicy::LabelBoundary => host.ends_with(domain) && host[..tail].ends_with('.'),
    }
}
