//! Sandbox - a small shell that runs programs under resource limits

#![deny(missing_debug_implementations, unused_import_braces)]

#[macro_use]
extern crate error_chain;

#[macro_use]
mod util;

pub mod core;
mod editor;
pub mod errors;
pub mod limits;
pub mod shell;

pub use crate::limits::{Limit, LimitKind, ResourceLimits};
pub use crate::shell::{Shell, ShellConfig};
