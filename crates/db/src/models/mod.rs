//! Entity models mirroring database rows.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus create DTOs where inserts take structured input.

pub mod ai_result;
pub mod audit;
pub mod event;
pub mod ledger;
pub mod product;
