//! Wire encodings for job records.
//!
//! Backends that store jobs as flat string maps (Redis hashes) share the
//! [`hash`] codec, which keeps the field layout in one place.

pub mod hash;

pub use hash::{decode_record, encode_record, HashFields};
