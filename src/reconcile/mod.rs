//! Reconciliation of external program trees into the question bank.
//!
//! [`import_program`] is the entry point used by the CLI: it fetches a
//! program tree through a [`crate::api::ProgramReader`], then replays it
//! into the local schema inside a single transaction. [`import_tree`] is
//! the transactional core and is what the integration tests drive.

pub mod engine;
pub mod error;

pub use engine::{ImportResult, import_program, import_tree};
pub use error::ImportError;
