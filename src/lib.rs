//! Bridge media - chat payload normalizer
//!
//! Classifies raw message markup into typed records and acquires the media
//! those messages reference, waiting out the window in which the client has
//! announced a message but not yet finished writing its file.

pub mod markup;
pub mod record;
pub mod extract;
pub mod classify;
pub mod fetch;
pub mod resolve;
pub mod persist;
pub mod config;
pub mod error;

pub use classify::{classify, ClassifiedMessage, MessageKind};
pub use error::{Error, Result};
pub use record::{BlobData, ExtractedRecord, MediaReference, RawPayload};
pub use resolve::{MediaOutcome, MediaResolver};
