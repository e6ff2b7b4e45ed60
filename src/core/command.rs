use std::ffi::CString;
use std::fmt;

use super::redirection::{self, Redirect, Redirection};
use crate::errors::{ErrorKind, Result};

/// An external program invocation with its redirections applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimpleCommand {
    /// Program name followed by its arguments; never empty.
    pub argv: Vec<String>,
    pub stdin: Option<Redirect>,
    pub stdout: Option<Redirect>,
    pub background: bool,
}

impl SimpleCommand {
    /// Builds a command from expanded words.
    ///
    /// Fails with `MissingCommand` when nothing but directives remain.
    pub fn parse<S: AsRef<str>>(words: &[S]) -> Result<SimpleCommand> {
        let (argv, Redirection { input, output, background }) =
            redirection::extract_redirections(words);
        if argv.is_empty() {
            let line = words
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<&str>>()
                .join(" ");
            bail!(ErrorKind::MissingCommand(line));
        }

        Ok(SimpleCommand {
            argv,
            stdin: input,
            stdout: output,
            background,
        })
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// Converts the argument vector for `execvp`.
    pub fn exec_args(&self) -> Result<Vec<CString>> {
        let mut args = Vec::with_capacity(self.argv.len());
        for arg in &self.argv {
            args.push(CString::new(arg.as_bytes())?);
        }
        Ok(args)
    }
}

impl fmt::Display for SimpleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::Path;

    use crate::core::redirection::RedirectMode;
    use crate::errors::Error;

    #[test]
    fn test_parse_compacts_argv() {
        let command = SimpleCommand::parse(&["sort", "<in", "-r", ">>out", "&"]).unwrap();
        assert_eq!(command.argv, vec!["sort", "-r"]);
        assert_eq!(command.program(), "sort");
        assert_eq!(
            command.stdin.as_ref().map(|r| r.path.as_path()),
            Some(Path::new("in"))
        );
        assert_eq!(
            command.stdout.as_ref().map(|r| r.mode),
            Some(RedirectMode::Append)
        );
        assert!(command.background);
        assert_eq!(command.to_string(), "sort -r");
    }

    #[test]
    fn test_parse_missing_command() {
        match SimpleCommand::parse(&[">out", "&"]) {
            Err(Error(ErrorKind::MissingCommand(line), _)) => assert_eq!(line, ">out &"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_exec_args_rejects_nul() {
        let command = SimpleCommand::parse(&["echo", "a\0b"]).unwrap();
        assert!(command.exec_args().is_err());

        let command = SimpleCommand::parse(&["echo", "ab"]).unwrap();
        let args = command.exec_args().unwrap();
        assert_eq!(args[1].to_str().unwrap(), "ab");
    }
}
