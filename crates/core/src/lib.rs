//! Core types for aedelore-migrate
//!
//! Records, the table plan, SQL literal rendering and insert statement
//! building. Shared by the storage backends and the migration service.

pub mod constants;
pub mod env_config;
mod error;
pub mod literal;
mod record;
mod report;
mod statement;
mod table;

pub use error::*;
pub use record::*;
pub use report::*;
pub use statement::*;
pub use table::*;
