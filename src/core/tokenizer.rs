/// Splits an input line into words.
///
/// Only the text before the first newline is considered. Words are separated
/// by runs of spaces; there is no quoting or escaping, so a space always
/// splits.
pub fn tokenize(line: &str) -> Vec<String> {
    line.split('\n')
        .next()
        .unwrap_or("")
        .split(' ')
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}
