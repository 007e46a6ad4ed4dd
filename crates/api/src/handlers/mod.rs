//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource.
//! Handlers delegate to `trustchain_db` repositories and the submission
//! pipeline, mapping errors via [`AppError`](crate::error::AppError).

pub mod checkpoint;
pub mod dkg;
pub mod product;
pub mod scan;
