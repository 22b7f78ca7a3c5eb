//! Repository layer for database operations

pub mod instances;
pub mod option_sets;
pub mod questions;
pub mod surveys;
