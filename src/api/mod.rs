//! External metadata registry client
//!
//! Fetches program and dataset definitions over HTTP, decodes the
//! junction-heavy wire payloads and hands the reconciliation engine a
//! validated [`models::ExternalProgramTree`].

pub mod client;
pub mod constants;
pub mod models;
pub mod wire;

pub use client::{ProgramReader, RegistryClient};
pub use models::{
    ExternalElement, ExternalOption, ExternalOptionSet, ExternalProgramTree, ExternalStage,
    ProgramDomain, ProgramType, RegistryDomain,
};
