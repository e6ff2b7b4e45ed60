//! Sandbox - Shell Module
//!
//! The Shell owns the job table and the resource limits. Each line is
//! tokenized and expanded, then either handled by a builtin or launched as an
//! external program.

use std::env;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::process;

use log::{debug, error, info, warn};
use rustyline::error::ReadlineError;

use super::{
    builtins,
    job_control::JobTable,
    process::{self as launcher, Launched, ProcessControl, UnixProcessControl},
    ShellConfig,
};
use crate::{
    core::{tokenizer, variable_expansion, SimpleCommand},
    editor::Editor,
    errors::{Error, ErrorKind, Result},
    util,
};

const SHELL_NAME: &str = "sandbox";
const SYNTAX_ERROR_EXIT_STATUS: i32 = 2;
const FAILURE_EXIT_STATUS: i32 = 1;

/// Sandbox Shell
pub struct Shell {
    config: ShellConfig,
    jobs: JobTable,
    process_control: Box<dyn ProcessControl>,
    /// Exit status of last command executed.
    last_exit_status: i32,
}

impl Shell {
    /// Constructs a new Shell that launches real processes.
    pub fn new(config: ShellConfig) -> Shell {
        Shell::with_process_control(config, Box::new(UnixProcessControl))
    }

    /// Constructs a new Shell that launches processes through `process_control`.
    pub fn with_process_control(
        config: ShellConfig,
        process_control: Box<dyn ProcessControl>,
    ) -> Shell {
        debug!("limits: {:?}", config.limits());
        info!("sandbox started up");
        Shell {
            config,
            jobs: JobTable::default(),
            process_control,
            last_exit_status: 0,
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Exit status of the last foreground command or builtin.
    pub fn last_exit_status(&self) -> i32 {
        self.last_exit_status
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    /// Custom prompt to output to the user, e.g. `amy@sandbox:~/src> `.
    pub fn prompt(&self) -> String {
        let user = env::var("USER").unwrap_or_default();
        let cwd = env::current_dir()
            .map(|cwd| util::shorten_home(cwd, dirs::home_dir()))
            .unwrap_or_else(|_| "?".to_string());
        format!("{}@{}:{}> ", user, SHELL_NAME, cwd)
    }

    /// Runs a single line of input.
    ///
    /// Blank lines do nothing. Errors are returned to the caller, which
    /// decides how to report them; the shell itself stays usable.
    pub fn execute_line(&mut self, line: &str) -> Result<()> {
        let words = tokenizer::tokenize(line);
        if words.is_empty() {
            return Ok(());
        }

        let words = variable_expansion::expand_variables(&words);
        if builtins::is_builtin(&words[0]) {
            let (status, result) =
                builtins::run(self, &words[0], &words[1..], &mut io::stdout());
            self.last_exit_status = status;
            return result;
        }

        let command = SimpleCommand::parse(&words)?;
        let launched = launcher::launch(
            self.process_control.as_mut(),
            &command,
            self.config.limits(),
            &mut self.jobs,
        )?;

        match launched {
            Launched::Waited(status) => {
                if let Some(code) = status.code() {
                    self.last_exit_status = code;
                }
            }
            Launched::Registered(_) => self.last_exit_status = 0,
        }
        Ok(())
    }

    /// Runs each line of `input` in order, reporting failures as they occur.
    pub fn execute_command_string(&mut self, input: &str) {
        for line in input.split('\n') {
            let result = self.execute_line(line);
            self.report_if_err(result);
        }
    }

    /// Prompts for and runs lines until end of input, then prints a newline.
    ///
    /// When stdin is not a terminal the lines are read as is, without a
    /// prompt or history. A line that is not valid UTF-8 is reported and the
    /// shell moves on to the next one.
    pub fn execute_from_stdin(&mut self) -> Result<()> {
        if !self.config.is_interactive() || !util::isatty() {
            let stdin = io::stdin();
            self.execute_from_reader(stdin.lock())?;
        } else {
            self.execute_from_editor()?;
        }

        println!();
        Ok(())
    }

    fn execute_from_editor(&mut self) -> Result<()> {
        let mut editor = Editor::new()?;
        loop {
            let line = match editor.readline(&self.prompt()) {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(ref e) if is_invalid_input(e) => {
                    warn!("discarding line: {}", e);
                    eprintln!("{}: {}", SHELL_NAME, e);
                    self.last_exit_status = FAILURE_EXIT_STATUS;
                    continue;
                }
                Err(e) => {
                    error!("failed to read line: {}", e);
                    return Err(e);
                }
            };

            if !line.trim().is_empty() {
                editor.add_history_entry(&line);
            }
            let result = self.execute_line(&line);
            self.report_if_err(result);
        }

        Ok(())
    }

    /// Runs every line from `reader` until it is exhausted.
    ///
    /// Bytes that are not valid UTF-8 are replaced with U+FFFD rather than
    /// ending the loop.
    pub fn execute_from_reader<R: BufRead>(&mut self, mut reader: R) -> Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let result = self.execute_line(&line);
            self.report_if_err(result);
        }
        Ok(())
    }

    /// Removes finished background jobs and lists the rest to `out`.
    pub fn poll_and_list_jobs(&mut self, out: &mut dyn Write) -> Result<()> {
        self.jobs
            .poll_and_list(self.process_control.as_mut(), out)
    }

    /// Terminates every background job and returns the status the shell
    /// should exit with.
    pub fn shutdown(&mut self) -> i32 {
        self.jobs.teardown(self.process_control.as_mut());
        info!("sandbox has shut down");
        self.last_exit_status
    }

    /// Exit the shell.
    ///
    /// Exit the shell with a status of n. If n is None, then the exit status is that of the last
    /// command executed. Like bash, n is reduced to the range 0 to 255.
    pub fn exit(&mut self, n: Option<i32>) -> ! {
        let last_exit_status = self.shutdown();
        let code = n.unwrap_or(last_exit_status);
        let code_like_u8 = ((code % 256) + 256) % 256;
        let temp_result = io::stdout().flush();
        log_if_err!(temp_result, "failed to flush stdout on exit");
        process::exit(code_like_u8);
    }

    fn report_if_err(&mut self, result: Result<()>) {
        if let Err(e) = result {
            error!("{}", e);
            eprintln!("{}: {}", SHELL_NAME, e);
            self.last_exit_status = exit_status_for(&e);
        }
    }
}

/// The line editor reports undecodable terminal input as an `InvalidData`
/// I/O error.
fn is_invalid_input(error: &Error) -> bool {
    match *error.kind() {
        ErrorKind::Readline(ReadlineError::Io(ref e)) => e.kind() == io::ErrorKind::InvalidData,
        _ => false,
    }
}

fn exit_status_for(error: &Error) -> i32 {
    match *error.kind() {
        ErrorKind::BuiltinCommandError(_, code) => code,
        ErrorKind::MissingCommand(_) => SYNTAX_ERROR_EXIT_STATUS,
        _ => FAILURE_EXIT_STATUS,
    }
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}\nlast exit status: {}\n{:?}",
            self.config, self.last_exit_status, self.jobs
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use nix::unistd::Pid;

    use crate::core::redirection::RedirectMode;
    use crate::limits::ResourceLimits;
    use crate::shell::process::{testing::FakeProcessControl, ChildStatus};

    macro_rules! generate_unique_env_key {
        () => {
            format!("KEYLINE{}COLUMN{}", line!(), column!())
        };
    }

    fn shell_with_fake(control: FakeProcessControl) -> (Shell, FakeProcessControl) {
        let shell =
            Shell::with_process_control(ShellConfig::default(), Box::new(control.clone()));
        (shell, control)
    }

    #[test]
    fn test_blank_line_does_nothing() {
        let (mut shell, control) = shell_with_fake(FakeProcessControl::new());
        shell.execute_line("").unwrap();
        shell.execute_line("    ").unwrap();
        assert!(control.spawned().is_empty());
    }

    #[test]
    fn test_background_command_is_registered() {
        let (mut shell, control) = shell_with_fake(FakeProcessControl::new());
        shell.execute_line("sleep 5 &").unwrap();

        assert_eq!(shell.jobs().len(), 1);
        assert_eq!(shell.jobs().jobs()[0].argv(), &["sleep", "5"]);
        assert_eq!(control.spawned().len(), 1);
    }

    #[test]
    fn test_foreground_status_is_kept() {
        let control = FakeProcessControl::new();
        control.finish(Pid::from_raw(101), ChildStatus::Exited(3));
        let (mut shell, _) = shell_with_fake(control);

        shell.execute_line("false").unwrap();

        assert_eq!(shell.last_exit_status(), 3);
        assert!(shell.jobs().is_empty());
    }

    #[test]
    fn test_expansion_happens_before_redirection() {
        let key = generate_unique_env_key!();
        env::set_var(&key, "report");
        let (mut shell, control) = shell_with_fake(FakeProcessControl::new());

        shell
            .execute_line(&format!("echo ${} >${}.txt", key, key))
            .unwrap();

        let (_, command) = &control.spawned()[0];
        assert_eq!(command.argv, vec!["echo", "report"]);
        let stdout = command.stdout.as_ref().unwrap();
        assert_eq!(stdout.path, PathBuf::from("report.txt"));
        assert_eq!(stdout.mode, RedirectMode::Truncate);
        env::remove_var(&key);
    }

    #[test]
    fn test_missing_command_is_reported() {
        let (mut shell, control) = shell_with_fake(FakeProcessControl::new());

        match shell.execute_line(">out &") {
            Err(Error(ErrorKind::MissingCommand(_), _)) => {}
            other => panic!("expected MissingCommand, got {:?}", other),
        }
        assert!(control.spawned().is_empty());

        shell.execute_command_string(">out");
        assert_eq!(shell.last_exit_status(), SYNTAX_ERROR_EXIT_STATUS);
    }

    #[test]
    fn test_fork_failure_keeps_shell_running() {
        let control = FakeProcessControl::new();
        control.fail_spawns();
        let (mut shell, _) = shell_with_fake(control);

        shell.execute_command_string("ls\nls &");

        assert_eq!(shell.last_exit_status(), FAILURE_EXIT_STATUS);
        assert!(shell.jobs().is_empty());
    }

    #[test]
    fn test_cd_failure_is_surfaced() {
        let (mut shell, _) = shell_with_fake(FakeProcessControl::new());

        match shell.execute_line("cd /definitely/not/a/real/dir") {
            Err(Error(ErrorKind::BuiltinCommandError(message, 1), _)) => {
                assert!(message.starts_with("cd: /definitely/not/a/real/dir"))
            }
            other => panic!("expected cd failure, got {:?}", other),
        }
        assert_eq!(shell.last_exit_status(), 1);
    }

    #[test]
    fn test_jobs_listing_and_shutdown() {
        let (mut shell, control) = shell_with_fake(FakeProcessControl::new());
        shell.execute_command_string("sleep 5 &\nsleep 1 &");

        let mut out = Vec::new();
        shell.poll_and_list_jobs(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("2 jobs.\n"));
        assert!(out.contains("     101  - sleep 5\n"));
        assert!(out.contains("     102  - sleep 1\n"));

        assert_eq!(shell.shutdown(), 0);
        assert_eq!(shell.shutdown(), 0);
        assert!(shell.jobs().is_empty());
        assert_eq!(
            control.terminated(),
            vec![Pid::from_raw(101), Pid::from_raw(102)]
        );
    }

    #[test]
    fn test_reader_runs_every_line() {
        let (mut shell, control) = shell_with_fake(FakeProcessControl::new());
        let input = io::Cursor::new("echo one\n\ncat <in.txt &\n>bad\n");

        shell.execute_from_reader(input).unwrap();

        let argvs: Vec<Vec<String>> = control
            .spawned()
            .into_iter()
            .map(|(_, command)| command.argv)
            .collect();
        assert_eq!(argvs, vec![vec!["echo", "one"], vec!["cat"]]);
        assert_eq!(shell.jobs().len(), 1);
        assert_eq!(shell.last_exit_status(), SYNTAX_ERROR_EXIT_STATUS);
    }

    #[test]
    fn test_reader_replaces_invalid_utf8() {
        let (mut shell, control) = shell_with_fake(FakeProcessControl::new());
        let input = io::Cursor::new(&b"echo \xff\necho after\n"[..]);

        shell.execute_from_reader(input).unwrap();

        let argvs: Vec<Vec<String>> = control
            .spawned()
            .into_iter()
            .map(|(_, command)| command.argv)
            .collect();
        assert_eq!(argvs, vec![vec!["echo", "\u{FFFD}"], vec!["echo", "after"]]);
        assert_eq!(shell.last_exit_status(), 0);
    }

    #[test]
    fn test_invalid_terminal_input_is_recognized() {
        let readline_error = |kind| -> Error {
            ReadlineError::Io(io::Error::new(kind, "unreadable")).into()
        };

        assert!(is_invalid_input(&readline_error(io::ErrorKind::InvalidData)));
        assert!(!is_invalid_input(&readline_error(io::ErrorKind::UnexpectedEof)));
        assert!(!is_invalid_input(&ErrorKind::MissingCommand(">x".to_string()).into()));
    }

    #[test]
    fn test_prompt_shape() {
        let shell = Shell::with_process_control(
            ShellConfig::interactive(ResourceLimits::default()),
            Box::new(FakeProcessControl::new()),
        );
        let prompt = shell.prompt();
        assert!(prompt.contains("@sandbox:"));
        assert!(prompt.ends_with("> "));
    }
}
