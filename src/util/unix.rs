use std::io;
use std::os::unix::io::AsRawFd;

use nix::unistd;

pub fn isatty() -> bool {
    let temp_result = unistd::isatty(io::stdin().as_raw_fd());
    log_if_err!(temp_result, "unistd::isatty");
    temp_result.unwrap_or(false)
}
