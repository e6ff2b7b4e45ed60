//! Error module. See the [error-chain](https://crates.io/crates/error-chain) crate for details.

#![allow(deprecated)]

error_chain! {
    foreign_links {
        Io(::std::io::Error);
        Nix(::nix::Error);
        Nul(::std::ffi::NulError);
        Readline(::rustyline::error::ReadlineError);
    }

    errors {
        InvalidLimit(flag: String, value: String) {
            description("invalid resource limit")
            display("invalid value for -{}: '{}' is not a non-negative integer", flag, value)
        }

        ForkFailed(program: String) {
            description("fork failed")
            display("{}: unable to create process", program)
        }

        MissingCommand(line: String) {
            description("missing command")
            display("missing command: '{}'", line)
        }

        BuiltinCommandError(message: String, code: i32) {
            description("builtin command error")
            display("{}", message)
        }
    }
}

impl Error {
    pub(crate) fn builtin_command<T: AsRef<str>>(message: T, code: i32) -> Error {
        ErrorKind::BuiltinCommandError(message.as_ref().to_string(), code).into()
    }
}
