//! Image-asset lifecycle for destination images.
//!
//! [`lifecycle`] is the per-request path (store, ensure thumbnail, delete);
//! [`jobs`] holds the batch maintenance passes that reconcile storage with
//! the database.

pub mod error;
pub mod jobs;
pub mod lifecycle;
mod offload;

pub use error::{MediaError, MediaResult};
