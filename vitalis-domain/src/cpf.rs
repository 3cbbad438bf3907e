//! CPF normalization.
//!
//! Both the importer and every query path canonicalize identifiers through
//! [`normalize`], so formatted ("529.310.074-20") and bare ("52931007420")
//! renditions of the same cpf always compare equal.

/// Strip the formatting punctuation from a cpf, returning the bare digit
/// string. Total: empty input yields an empty string.
pub fn normalize(raw: &str) -> String {
    raw.replace(['.', '-'], "")
}
