use crate::shell::builtins::{self, prelude::*};

/// Erase the display, then move the cursor to the top left.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[1;1H";

#[derive(Debug)]
pub struct Clear;

impl builtins::BuiltinCommand for Clear {
    const NAME: &'static str = builtins::CLEAR_NAME;

    const HELP: &'static str = "\
c: c
    Clear the terminal screen.";

    fn run<T: AsRef<str>>(_shell: &mut Shell, _args: &[T], stdout: &mut dyn Write) -> Result<()> {
        write!(stdout, "{}", CLEAR_SCREEN)?;
        stdout.flush()?;
        Ok(())
    }
}
