//! Entry fingerprinting for deduplication.
//!
//! The digest must be identical for the same logical entry on every run
//! and on every machine, so the canonical form depends only on the
//! entry's field values: names are lowercased and sorted, and each
//! (name, value) pair is hashed as length-prefixed frames so no
//! separator collisions are possible.

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::feed::Entry;

#[derive(Debug, Error, PartialEq)]
pub enum InvalidEntryError {
    #[error("entry has no fields")]
    Empty,
    #[error("entry has no link")]
    MissingLink,
}

/// Compute the deduplication digest of an entry: 64 lowercase hex chars
/// of SHA-256 over the canonicalized field set.
pub fn fingerprint(entry: &Entry) -> Result<String, InvalidEntryError> {
    if entry.fields().is_empty() {
        return Err(InvalidEntryError::Empty);
    }
    if entry.link().map_or(true, |link| link.trim().is_empty()) {
        return Err(InvalidEntryError::MissingLink);
    }

    let mut fields: Vec<(String, &str)> = entry
        .fields()
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.as_str()))
        .collect();
    // Stable sort: duplicate names keep their feed-supplied order.
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let mut hasher = Sha256::new();
    for (name, value) in &fields {
        hasher.update((name.len() as u64).to_be_bytes());
        hasher.update(name.as_bytes());
        hasher.update((value.len() as u64).to_be_bytes());
        hasher.update(value.as_bytes());
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(fields: &[(&str, &str)]) -> Entry {
        let mut entry = Entry::new();
        for (name, value) in fields {
            entry.push_field(*name, *value);
        }
        entry
    }

    #[test]
    fn same_fields_always_produce_the_same_digest() {
        let a = entry(&[("title", "A"), ("link", "http://x/1")]);
        let b = entry(&[("title", "A"), ("link", "http://x/1")]);
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn digest_ignores_field_order_and_name_casing() {
        let a = entry(&[("title", "A"), ("link", "http://x/1"), ("summary", "s")]);
        let b = entry(&[("Summary", "s"), ("LINK", "http://x/1"), ("Title", "A")]);
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn any_field_change_changes_the_digest() {
        let base = entry(&[("title", "A"), ("link", "http://x/1"), ("summary", "s")]);
        let edited = entry(&[("title", "A"), ("link", "http://x/1"), ("summary", "S")]);
        let extended = entry(&[
            ("title", "A"),
            ("link", "http://x/1"),
            ("summary", "s"),
            ("author", "me"),
        ]);

        let digest = fingerprint(&base).unwrap();
        assert_ne!(digest, fingerprint(&edited).unwrap());
        assert_ne!(digest, fingerprint(&extended).unwrap());
    }

    #[test]
    fn digest_matches_the_documented_framing() {
        let e = entry(&[("title", "A"), ("link", "http://x/1")]);

        // Recompute from the canonical layout: lowercased names, sorted,
        // each field as u64-be length-prefixed name and value frames.
        let mut hasher = Sha256::new();
        for (name, value) in [("link", "http://x/1"), ("title", "A")] {
            hasher.update((name.len() as u64).to_be_bytes());
            hasher.update(name.as_bytes());
            hasher.update((value.len() as u64).to_be_bytes());
            hasher.update(value.as_bytes());
        }

        assert_eq!(fingerprint(&e).unwrap(), format!("{:x}", hasher.finalize()));
    }

    #[test]
    fn digest_is_64_lowercase_hex_chars() {
        let digest = fingerprint(&entry(&[("title", "A"), ("link", "http://x/1")])).unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
    }

    #[test]
    fn rejects_malformed_entries() {
        assert!(matches!(
            fingerprint(&Entry::new()),
            Err(InvalidEntryError::Empty)
        ));
        assert!(matches!(
            fingerprint(&entry(&[("title", "A")])),
            Err(InvalidEntryError::MissingLink)
        ));
        assert!(matches!(
            fingerprint(&entry(&[("title", "A"), ("link", "  ")])),
            Err(InvalidEntryError::MissingLink)
        ));
    }
}
