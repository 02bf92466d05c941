//! Content pack documents for the campaign toolkit.
//!
//! A content pack is an externally authored JSON document that extends or
//! overrides the toolkit's baseline game data: additional spells, classes,
//! subclasses, feats, backgrounds, and allowlist grants for them. Packs are
//! imported privately by users and are never redistributed, so this crate
//! only deals with the document itself:
//!
//! - **Model**: [`ContentPack`], [`PackMetadata`], [`PackRecord`], and the
//!   open-ended [`ContentType`] tag.
//! - **Validation**: [`validate_text`] / [`validate_value`] produce an
//!   itemized error/warning report instead of failing on the first problem.
//! - **Canonical form**: [`to_canonical_json`] and the SHA-256
//!   [`content_hash`] used to fingerprint stored packs.
//!
//! Validation is pure and side-effect free, so it can run as a dry check
//! before anything touches storage.

pub mod canonical;
pub mod pack;
pub mod validate;

pub use canonical::{content_hash, to_canonical_json};
pub use pack::{
    split_composite_id, trimmed_id, ContentPack, ContentType, PackMetadata, PackRecord, Payload,
    RecordOperation, WellKnownContentType,
};
pub use validate::{validate_text, validate_value, PackValidation};
