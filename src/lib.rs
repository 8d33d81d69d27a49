//! Declarative symlink farm manager.
//!
//! A *garden* is a directory populated with symlinks into *packages*:
//! directories of files planted in a precedence order.  When several
//! packages provide the same path, the highest-precedence one wins.  The
//! garden records what it has planted in `.symlink-garden/manifest.json` and
//! uses that record to tell its own links from *weeds*, files nobody owns.
//!
//! The public API is organised into four layers:
//!
//! - **[`garden`]** - load the manifest and plan operations as a [`actions::Plan`]
//! - **[`actions`]** - self-describing filesystem mutations
//! - **[`runner`]** - dry-run reporting and sequential execution
//! - **[`commands`]** - top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod actions;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod garden;
pub mod lock;
pub mod logging;
pub mod runner;
