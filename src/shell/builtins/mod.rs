//! Sandbox builtins
//!
//! This module includes the implementations of the commands the shell runs
//! itself rather than launching a program.

use self::prelude::*;

use self::clear::Clear;
use self::dirs::Cd;
use self::exit::Exit;
use self::jobs::Jobs;

pub mod prelude {
    pub use std::io::Write;

    pub use crate::errors::{Error, ErrorKind, Result, ResultExt};
    pub use crate::shell::Shell;
}

mod clear;
mod dirs;
mod exit;
mod jobs;

const CD_NAME: &str = "cd";
const CLEAR_NAME: &str = "c";
const EXIT_NAME: &str = "exit";
const JOBS_NAME: &str = "jobs";

const HELP_FLAG: &str = "--help";

/// Represents a Sandbox builtin command such as cd or jobs.
pub trait BuiltinCommand {
    /// The NAME of the command.
    const NAME: &'static str;
    /// The help string to display to the user, shown for `--help`.
    const HELP: &'static str;
    /// Runs the command with the given arguments in the `shell` environment.
    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()>;
}

pub fn is_builtin<T: AsRef<str>>(program: T) -> bool {
    [CD_NAME, CLEAR_NAME, EXIT_NAME, JOBS_NAME].contains(&program.as_ref())
}

/// precondition: command is a builtin.
/// Returns (`exit_status_code`, `builtin_result`)
pub fn run<S1, S2>(
    shell: &mut Shell,
    program: S1,
    args: &[S2],
    stdout: &mut dyn Write,
) -> (i32, Result<()>)
where
    S1: AsRef<str>,
    S2: AsRef<str>,
{
    debug_assert!(is_builtin(&program));

    let wants_help = args
        .first()
        .map(|arg| arg.as_ref() == HELP_FLAG)
        .unwrap_or(false);
    let result = match program.as_ref() {
        name if wants_help => write_help(name, stdout),
        CD_NAME => Cd::run(shell, args, stdout),
        CLEAR_NAME => Clear::run(shell, args, stdout),
        EXIT_NAME => Exit::run(shell, args, stdout),
        JOBS_NAME => Jobs::run(shell, args, stdout),
        other => Err(Error::builtin_command(
            format!("{}: not a builtin", other),
            2,
        )),
    };

    let exit_status = get_builtin_exit_status(&result);
    (exit_status, result)
}

fn write_help(program: &str, stdout: &mut dyn Write) -> Result<()> {
    let help = match program {
        CD_NAME => Cd::HELP,
        CLEAR_NAME => Clear::HELP,
        EXIT_NAME => Exit::HELP,
        JOBS_NAME => Jobs::HELP,
        other => {
            return Err(Error::builtin_command(
                format!("{}: not a builtin", other),
                2,
            ))
        }
    };
    writeln!(stdout, "{}", help)?;
    Ok(())
}

fn get_builtin_exit_status(result: &Result<()>) -> i32 {
    if let Err(ref e) = *result {
        match *e.kind() {
            ErrorKind::BuiltinCommandError(_, code) => code,
            _ => 1,
        }
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::shell::{
        process::{testing::FakeProcessControl, ChildStatus},
        ShellConfig,
    };

    fn shell() -> (Shell, FakeProcessControl) {
        let control = FakeProcessControl::new();
        let shell =
            Shell::with_process_control(ShellConfig::default(), Box::new(control.clone()));
        (shell, control)
    }

    #[test]
    fn test_is_builtin() {
        for name in &["cd", "c", "exit", "jobs"] {
            assert!(is_builtin(name), "{} should be a builtin", name);
        }
        for name in &["ls", "clear", "job", "cd2", ""] {
            assert!(!is_builtin(name), "{} should not be a builtin", name);
        }
    }

    #[test]
    fn test_jobs_builtin_lists_running_jobs() {
        let (mut shell, control) = shell();
        shell.execute_command_string("sleep 5 &\nsleep 1 &");
        control.finish(nix::unistd::Pid::from_raw(102), ChildStatus::Exited(0));

        let mut out = Vec::new();
        let (status, result) = run(&mut shell, "jobs", &[] as &[&str], &mut out);

        assert!(result.is_ok());
        assert_eq!(status, 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "1 jobs.\n     101  - sleep 5\n"
        );
    }

    #[test]
    fn test_clear_builtin_writes_escape() {
        let (mut shell, _) = shell();
        let mut out = Vec::new();
        let (status, result) = run(&mut shell, "c", &[] as &[&str], &mut out);
        assert!(result.is_ok());
        assert_eq!(status, 0);
        assert!(out.starts_with(b"\x1b["));
    }

    #[test]
    fn test_help_flag_prints_help_without_running() {
        let (mut shell, control) = shell();
        shell.execute_command_string("sleep 5 &");

        let mut out = Vec::new();
        let (status, result) = run(&mut shell, "exit", &["--help"], &mut out);
        assert!(result.is_ok());
        assert_eq!(status, 0);
        assert!(String::from_utf8(out).unwrap().starts_with("exit: exit [n]\n"));
        assert!(control.terminated().is_empty());

        let mut out = Vec::new();
        let (status, _) = run(&mut shell, "cd", &["--help", "/no/such/place"], &mut out);
        assert_eq!(status, 0);
        assert!(String::from_utf8(out).unwrap().starts_with("cd: cd [dir]\n"));
    }

    #[test]
    fn test_cd_failure_status() {
        let (mut shell, _) = shell();
        let mut out = Vec::new();
        let (status, result) = run(&mut shell, "cd", &["/no/such/place/anywhere"], &mut out);
        assert_eq!(status, 1);
        assert!(result.is_err());
    }
}
