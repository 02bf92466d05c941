//! Canonical serialized form and content fingerprinting.
//!
//! A stored pack is exported back to JSON from the typed model, not from the
//! original import text, so formatting quirks in the source file never leak
//! into the export. The content hash fingerprints the compact canonical
//! form; two imports of the same logical pack hash identically regardless
//! of whitespace in the author's file.

use crate::pack::ContentPack;
use sha2::{Digest, Sha256};

/// Serialize a pack to its canonical JSON text.
pub fn to_canonical_json(pack: &ContentPack, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(pack)
    } else {
        serde_json::to_string(pack)
    }
}

/// Lowercase hex SHA-256 of the compact canonical JSON.
pub fn content_hash(pack: &ContentPack) -> Result<String, serde_json::Error> {
    let text = to_canonical_json(pack, false)?;
    let digest = Sha256::digest(text.as_bytes());
    Ok(hex::encode(digest))
}
