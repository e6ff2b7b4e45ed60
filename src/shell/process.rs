//! Launching external programs.
//!
//! All OS process handling sits behind `ProcessControl` so the launcher and
//! the job table can be exercised without creating real processes.

use std::ffi::CString;
use std::fmt;
use std::os::unix::io::RawFd;

use log::{debug, error, warn};
use nix::errno::Errno;
use nix::fcntl::{self, OFlag};
use nix::libc;
use nix::sys::signal::{self, Signal};
use nix::sys::stat::Mode;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};

use super::job_control::JobTable;
use crate::{
    core::{
        redirection::{Redirect, RedirectMode},
        SimpleCommand,
    },
    errors::{ErrorKind, Result, ResultExt},
    limits::ResourceLimits,
};

const CHILD_FAILURE_STATUS: i32 = 1;

/// Observed state of a child process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildStatus {
    Running,
    Exited(i32),
    Signaled(Signal),
    /// The process is no longer a child of the shell, e.g. it was already
    /// reaped.
    Vanished,
}

impl ChildStatus {
    pub fn is_finished(self) -> bool {
        self != ChildStatus::Running
    }

    /// Exit code in the shell convention: 128 + n for a child killed by
    /// signal n.
    pub fn code(self) -> Option<i32> {
        match self {
            ChildStatus::Exited(code) => Some(code),
            ChildStatus::Signaled(sig) => Some(128 + sig as i32),
            ChildStatus::Running | ChildStatus::Vanished => None,
        }
    }
}

impl fmt::Display for ChildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ChildStatus::Running => write!(f, "running"),
            ChildStatus::Exited(code) => write!(f, "exited with {}", code),
            ChildStatus::Signaled(sig) => write!(f, "terminated by {:?}", sig),
            ChildStatus::Vanished => write!(f, "no longer a child"),
        }
    }
}

/// Process creation and supervision primitives.
pub trait ProcessControl: fmt::Debug {
    /// Starts `command` in a new process under `limits` and returns its id
    /// without waiting.
    fn spawn(&mut self, command: &SimpleCommand, limits: &ResourceLimits) -> Result<Pid>;

    /// Blocks until `pid` exits.
    fn wait(&mut self, pid: Pid) -> Result<ChildStatus>;

    /// Checks on `pid` without blocking, reaping it if it has exited.
    fn poll(&mut self, pid: Pid) -> Result<ChildStatus>;

    /// Asks `pid` to terminate. Does not wait for it.
    fn terminate(&mut self, pid: Pid) -> Result<()>;
}

/// What happened to a launched command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Launched {
    /// A foreground command ran to completion.
    Waited(ChildStatus),
    /// A background command was recorded in the job table.
    Registered(Pid),
}

/// Runs `command` in the foreground or background depending on its `&`
/// directive.
pub fn launch(
    control: &mut dyn ProcessControl,
    command: &SimpleCommand,
    limits: &ResourceLimits,
    jobs: &mut JobTable,
) -> Result<Launched> {
    if command.background {
        spawn_background(control, command, limits, jobs).map(Launched::Registered)
    } else {
        spawn_foreground(control, command, limits).map(Launched::Waited)
    }
}

/// Starts `command` and blocks until that child exits.
pub fn spawn_foreground(
    control: &mut dyn ProcessControl,
    command: &SimpleCommand,
    limits: &ResourceLimits,
) -> Result<ChildStatus> {
    let pid = control.spawn(command, limits)?;
    let status = control.wait(pid)?;
    debug!("foreground job {} ({}) {}", pid, command, status);
    Ok(status)
}

/// Starts `command` and records it in `jobs` without waiting.
pub fn spawn_background(
    control: &mut dyn ProcessControl,
    command: &SimpleCommand,
    limits: &ResourceLimits,
    jobs: &mut JobTable,
) -> Result<Pid> {
    let pid = control.spawn(command, limits)?;
    jobs.register(pid, command.argv.clone());
    debug!("background job {} ({}) registered", pid, command);
    Ok(pid)
}

/// `ProcessControl` backed by `fork`, `execvp` and `waitpid`.
#[derive(Debug, Default)]
pub struct UnixProcessControl;

impl ProcessControl for UnixProcessControl {
    fn spawn(&mut self, command: &SimpleCommand, limits: &ResourceLimits) -> Result<Pid> {
        // Built before forking so the child does not allocate on its way to exec.
        let args = command.exec_args()?;

        let fork_result = unsafe { unistd::fork() };
        match fork_result {
            Ok(ForkResult::Child) => exec_child(command, &args, limits),
            Ok(ForkResult::Parent { child }) => {
                debug!("forked {} for '{}'", child, command);
                Ok(child)
            }
            Err(e) => {
                error!("fork failed for '{}': {}", command, e);
                Err(e).chain_err(|| ErrorKind::ForkFailed(command.program().to_string()))
            }
        }
    }

    fn wait(&mut self, pid: Pid) -> Result<ChildStatus> {
        loop {
            match wait::waitpid(pid, None) {
                Ok(wait_status) => {
                    let status = child_status(wait_status);
                    if status.is_finished() {
                        return Ok(status);
                    }
                }
                Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => return Ok(ChildStatus::Vanished),
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn poll(&mut self, pid: Pid) -> Result<ChildStatus> {
        match wait::waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(wait_status) => Ok(child_status(wait_status)),
            Err(Errno::ECHILD) => Ok(ChildStatus::Vanished),
            Err(e) => Err(e.into()),
        }
    }

    fn terminate(&mut self, pid: Pid) -> Result<()> {
        match signal::kill(pid, Signal::SIGTERM) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn child_status(wait_status: WaitStatus) -> ChildStatus {
    match wait_status {
        WaitStatus::Exited(_, code) => ChildStatus::Exited(code),
        WaitStatus::Signaled(_, sig, _) => ChildStatus::Signaled(sig),
        _ => ChildStatus::Running,
    }
}

/// Runs in the forked child: rebinds stdio, applies limits, then replaces the
/// process image. Never returns.
fn exec_child(command: &SimpleCommand, args: &[CString], limits: &ResourceLimits) -> ! {
    for redirect in command.stdin.iter().chain(command.stdout.iter()) {
        if let Err(e) = redirect_stdio(redirect) {
            eprintln!("sandbox: {}: {}", redirect.path.display(), e.desc());
            exit_child();
        }
    }

    if let Err(e) = limits.apply() {
        warn!("unable to apply resource limits for '{}': {}", command, e);
    }

    let e = match unistd::execvp(&args[0], args) {
        Ok(never) => match never {},
        Err(e) => e,
    };
    eprintln!("{}: {}", command.program(), e.desc());
    exit_child()
}

/// Opens the redirect target and moves it onto stdin or stdout.
fn redirect_stdio(redirect: &Redirect) -> nix::Result<()> {
    let (flags, target): (OFlag, RawFd) = match redirect.mode {
        RedirectMode::Truncate => (
            OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
            libc::STDOUT_FILENO,
        ),
        RedirectMode::Append => (
            OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND,
            libc::STDOUT_FILENO,
        ),
        RedirectMode::Read => (OFlag::O_RDONLY, libc::STDIN_FILENO),
    };

    let fd = fcntl::open(redirect.path.as_path(), flags, Mode::from_bits_truncate(0o666))?;
    if fd != target {
        unistd::dup2(fd, target)?;
        unistd::close(fd)?;
    }
    Ok(())
}

fn exit_child() -> ! {
    // _exit skips the parent's atexit handlers and buffered stdio copies.
    unsafe {
        libc::_exit(CHILD_FAILURE_STATUS)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeProcessControl;
    use super::*;

    use crate::errors::Error;

    fn command(words: &[&str]) -> SimpleCommand {
        SimpleCommand::parse(words).unwrap()
    }

    #[test]
    fn test_foreground_waits_for_child() {
        let mut control = FakeProcessControl::new();
        let mut jobs = JobTable::default();
        control.finish(Pid::from_raw(101), ChildStatus::Exited(3));

        let launched = launch(
            &mut control,
            &command(&["false"]),
            &ResourceLimits::default(),
            &mut jobs,
        )
        .unwrap();

        assert_eq!(launched, Launched::Waited(ChildStatus::Exited(3)));
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_background_registers_job() {
        let mut control = FakeProcessControl::new();
        let mut jobs = JobTable::default();

        let launched = launch(
            &mut control,
            &command(&["sleep", "5", ">out", "&"]),
            &ResourceLimits::default(),
            &mut jobs,
        )
        .unwrap();

        let pid = Pid::from_raw(101);
        assert_eq!(launched, Launched::Registered(pid));
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs.jobs()[0].pid(), pid);
        assert_eq!(jobs.jobs()[0].argv(), &["sleep".to_string(), "5".to_string()]);
        assert!(!control.has_pending_statuses());
        assert_eq!(control.spawned().len(), 1);
    }

    #[test]
    fn test_fork_failure_creates_no_job() {
        let mut control = FakeProcessControl::new();
        control.fail_spawns();
        let mut jobs = JobTable::default();

        let result = launch(
            &mut control,
            &command(&["sleep", "1", "&"]),
            &ResourceLimits::default(),
            &mut jobs,
        );

        match result {
            Err(Error(ErrorKind::ForkFailed(program), _)) => assert_eq!(program, "sleep"),
            other => panic!("expected ForkFailed, got {:?}", other),
        }
        assert!(jobs.is_empty());
        assert!(control.spawned().is_empty());
    }

    #[test]
    fn test_child_status_codes() {
        assert_eq!(ChildStatus::Exited(0).code(), Some(0));
        assert_eq!(ChildStatus::Signaled(Signal::SIGTERM).code(), Some(143));
        assert_eq!(ChildStatus::Running.code(), None);
        assert!(!ChildStatus::Running.is_finished());
        assert!(ChildStatus::Vanished.is_finished());
    }
}
