//! The shell context and everything it drives: the launcher, the job table
//! and the built-in commands.

pub mod builtins;
pub mod job_control;
pub mod process;
#[allow(clippy::module_inception)]
mod shell;

pub use self::job_control::{Job, JobTable};
pub use self::process::{ChildStatus, Launched, ProcessControl, UnixProcessControl};
pub use self::shell::Shell;

use crate::limits::ResourceLimits;

/// Policy object to control a Shell's behavior
#[derive(Debug, Copy, Clone)]
pub struct ShellConfig {
    /// Limits re-applied to every launched program.
    limits: ResourceLimits,

    /// Determines if a prompt is shown and lines are read through the line
    /// editor.
    interactive: bool,
}

impl ShellConfig {
    /// Creates an interactive shell, e.g. prompt and line editing
    ///
    /// # Complete List
    /// - A prompt is displayed before each line
    /// - Lines are read through the line editor with in-memory history
    pub fn interactive(limits: ResourceLimits) -> Self {
        Self {
            limits,
            interactive: true,
        }
    }

    /// Creates a noninteractive shell, e.g. for running a command string
    ///
    /// # Complete List
    /// - No prompt is displayed
    pub fn noninteractive(limits: ResourceLimits) -> Self {
        Self {
            limits,
            interactive: false,
        }
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self::noninteractive(ResourceLimits::default())
    }
}
