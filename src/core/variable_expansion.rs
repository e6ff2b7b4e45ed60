use std::env;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref VARIABLE: Regex = Regex::new(r"\$([[:alnum:]]*)").unwrap();
}

/// Expands environment variables in every word using the process environment.
pub fn expand_variables<S: AsRef<str>>(words: &[S]) -> Vec<String> {
    expand_variables_with(words, |name| env::var(name).ok())
}

/// Expands variables in every word, resolving names through `lookup`.
pub fn expand_variables_with<S, F>(words: &[S], lookup: F) -> Vec<String>
where
    S: AsRef<str>,
    F: Fn(&str) -> Option<String>,
{
    words
        .iter()
        .map(|w| expand_variables_word(w.as_ref(), &lookup))
        .collect()
}

/// Expands the first `$NAME` in `word`.
///
/// `NAME` is the longest run of ASCII alphanumerics after the `$` and may be
/// empty. Unset variables expand to nothing. Any later `$` in the word is
/// kept as literal text and expanded values are never rescanned.
pub fn expand_variables_word<F>(word: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let captures = match VARIABLE.captures(word) {
        Some(captures) => captures,
        None => return word.to_string(),
    };

    let (whole, name) = match (captures.get(0), captures.get(1)) {
        (Some(whole), Some(name)) => (whole, name),
        _ => return word.to_string(),
    };

    let value = lookup(name.as_str()).unwrap_or_default();
    let mut expanded = String::with_capacity(word.len() + value.len());
    expanded.push_str(&word[..whole.start()]);
    expanded.push_str(&value);
    expanded.push_str(&word[whole.end()..]);
    expanded
}
