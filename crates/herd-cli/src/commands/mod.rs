pub mod common;
pub mod completions;
pub mod config;
pub mod create;
pub mod delete;
pub mod list;
pub mod status;
pub mod sync;
pub mod update;
