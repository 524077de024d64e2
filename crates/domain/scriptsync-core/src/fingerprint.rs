//! Content fingerprinting for change detection and transfer dedup.
//!
//! A fingerprint identifies one version of a file's content. Clients compare
//! fingerprints against their local copies to skip unchanged transfers, and
//! change notifications carry the fingerprint of the version read at emission
//! time. A 128-bit digest is sufficient here; this is a change-detection aid,
//! not a security control.

pub type Fingerprint = String;

/// Compute the fingerprint of a piece of text content.
///
/// Deterministic: the same content always yields the same 32-char lowercase
/// hex digest.
pub fn fingerprint(content: &str) -> Fingerprint {
    format!("{:x}", md5::compute(content.as_bytes()))
}
