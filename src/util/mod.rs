/// Logs the error of a `Result` without altering control flow.
macro_rules! log_if_err {
    ($result:expr, $fmt:expr) => {{
        if let Err(ref e) = $result {
            log::error!("{}: {}", $fmt, e);
        }
    }};
    ($result:expr, $fmt:expr, $($arg:tt)+) => {{
        if let Err(ref e) = $result {
            log::error!("{}: {}", format_args!($fmt, $($arg)+), e);
        }
    }};
}

#[cfg(unix)]
pub use self::unix::isatty;

#[cfg(unix)]
pub mod unix;

/// Replaces a leading `home` component of `path` with `~`.
pub fn shorten_home<P, H>(path: P, home: Option<H>) -> String
where
    P: AsRef<std::path::Path>,
    H: AsRef<std::path::Path>,
{
    let path = path.as_ref();
    match home.as_ref().map(|h| path.strip_prefix(h)) {
        Some(Ok(rel)) if rel.as_os_str().is_empty() => "~".to_string(),
        Some(Ok(rel)) => format!("~/{}", rel.display()),
        _ => path.display().to_string(),
    }
}
