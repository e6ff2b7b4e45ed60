use std::path::PathBuf;

const APPEND_OPERATOR: &str = ">>";
const TRUNCATE_OPERATOR: &str = ">";
const READ_OPERATOR: &str = "<";
const BACKGROUND_OPERATOR: &str = "&";

/// How a redirection target is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedirectMode {
    /// Create the file if needed and truncate it; bound to stdout.
    Truncate,
    /// Create the file if needed and append to it; bound to stdout.
    Append,
    /// Open the file read-only; bound to stdin.
    Read,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redirect {
    pub path: PathBuf,
    pub mode: RedirectMode,
}

impl Redirect {
    fn new<P: Into<PathBuf>>(path: P, mode: RedirectMode) -> Self {
        Redirect {
            path: path.into(),
            mode,
        }
    }
}

/// Redirection and background directives pulled out of one command.
///
/// Input and output are tracked separately. When a kind appears more than
/// once, the last occurrence wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Redirection {
    pub input: Option<Redirect>,
    pub output: Option<Redirect>,
    pub background: bool,
}

/// Scans `words` once, left to right, removing directives.
///
/// A word containing `>>`, `>` or `<` anywhere is a redirection whose target
/// is the text after the operator. Only a word that is exactly `&` requests
/// background execution. Returns the remaining words in order along with the
/// collected directives.
pub fn extract_redirections<S: AsRef<str>>(words: &[S]) -> (Vec<String>, Redirection) {
    let mut redirection = Redirection::default();
    let mut argv = Vec::with_capacity(words.len());

    for word in words.iter().map(AsRef::as_ref) {
        if let Some(target) = text_after(word, APPEND_OPERATOR) {
            redirection.output = Some(Redirect::new(target, RedirectMode::Append));
        } else if let Some(target) = text_after(word, TRUNCATE_OPERATOR) {
            redirection.output = Some(Redirect::new(target, RedirectMode::Truncate));
        } else if let Some(target) = text_after(word, READ_OPERATOR) {
            redirection.input = Some(Redirect::new(target, RedirectMode::Read));
        } else if word == BACKGROUND_OPERATOR {
            redirection.background = true;
        } else {
            argv.push(word.to_string());
        }
    }

    (argv, redirection)
}

fn text_after<'a>(word: &'a str, operator: &str) -> Option<&'a str> {
    word.find(operator)
        .map(|start| &word[start + operator.len()..])
}
