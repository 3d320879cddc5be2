//! Per-user sticker collections with free-text tags.
//!
//! A messaging-bot backend stores one row per (user, sticker, tag) triple
//! and manipulates those rows through batch set operations: add tags to a
//! sticker, remove a tag set, replace tags across many stickers, delete
//! stickers in bulk. Tags are normalized (lower-cased, trimmed, restricted
//! characters) on every write, and duplicates are rejected at a single
//! validation funnel. A presentation layer is expected to sit on top of
//! [`store::DataStore`]; none ships here.

pub mod batch;
pub mod error;
pub mod model;
pub mod normalize;
pub mod store;
pub mod strings;

pub use batch::{BatchReport, TagItem, TagOutcome};
pub use error::{StoreError, ValidationError};
pub use store::{DataStore, EntryFilter, EntryPatch, UserFilter, UserPatch, PAGE_SIZE};
