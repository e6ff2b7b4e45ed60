use std::env;
use std::path::PathBuf;

use crate::shell::builtins::{self, prelude::*};

#[derive(Debug)]
pub struct Cd;

impl builtins::BuiltinCommand for Cd {
    const NAME: &'static str = builtins::CD_NAME;

    const HELP: &'static str = "\
cd: cd [dir]
    Change the current directory to DIR. The variable $HOME is the default dir.";

    fn run<T: AsRef<str>>(_shell: &mut Shell, args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        let dir = match args.first() {
            Some(dir) => PathBuf::from(dir.as_ref()),
            None => ::dirs::home_dir()
                .ok_or_else(|| Error::builtin_command(format!("{}: HOME not set", Self::NAME), 1))?,
        };

        if let Err(e) = env::set_current_dir(&dir) {
            return Err(Error::builtin_command(
                format!("{}: {}: {}", Self::NAME, dir.display(), e),
                1,
            ));
        }

        log::debug!("changed directory to {}", dir.display());
        Ok(())
    }
}
