//! skillforge - scaffold and validate agent skill packages
//!
//! A skill package is a directory holding a `SKILL.md` manifest plus optional
//! `scripts/`, `references/` and `assets/`. Templates mark their sections as
//! CORE or OPTIONAL and carry `[TODO: ...]` placeholders; the initializer
//! instantiates a template into a new package, and the validator checks any
//! package against the structural and metadata rules.

pub mod cli;
pub mod config;
pub mod error;
pub mod init;
pub mod metadata;
pub mod package;
pub mod placeholder;
pub mod report;
pub mod rules;
pub mod section;
pub mod template;
pub mod util;
