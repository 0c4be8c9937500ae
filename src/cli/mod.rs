//! Subcommand implementations. Each `run` prints its own output and returns
//! `anyhow::Result`; `main` maps errors to exit codes.

pub mod config_check;
pub mod init;
pub mod templates;
pub mod validate;
