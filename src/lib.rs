pub mod api;
pub mod cli;
pub mod config;
pub mod reconcile;
pub mod render;
pub mod skiplogic;
