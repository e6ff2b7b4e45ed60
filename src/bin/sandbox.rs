use std::path::PathBuf;
use std::process;

use docopt::Docopt;
use log::{debug, error};
use nix::unistd::Pid;
use serde_derive::Deserialize;

use sandbox::errors::*;
use sandbox::{LimitKind, ResourceLimits, Shell, ShellConfig};

const LOG_FILE_NAME: &str = ".sandbox_log";
const FAILURE_EXIT_STATUS: i32 = 1;

const USAGE: &str = "
sandbox.

Usage:
    sandbox [options]
    sandbox [options] -c <command>
    sandbox (-h | --help)
    sandbox --version

Options:
    -h --help       Show this screen.
    --version       Show version.
    -c              Run each line of <command>, then exit.
    -p <count>      Maximum number of processes, defaults to 256.
    -d <bytes>      Maximum data segment size, defaults to 1 GiB.
    -s <bytes>      Maximum stack size, defaults to 1 GiB.
    -n <count>      Maximum number of open files, defaults to 256.
    -f <bytes>      Maximum size of a created file, defaults to 1 GiB.
    -t <seconds>    Maximum CPU time, defaults to 2^30 seconds.
    --log=<path>    File to write log to, defaults to ~/.sandbox_log
";

/// Docopts input arguments.
#[derive(Debug, Deserialize)]
struct Args {
    arg_command: Option<String>,
    flag_version: bool,
    flag_c: bool,
    flag_p: Option<String>,
    flag_d: Option<String>,
    flag_s: Option<String>,
    flag_n: Option<String>,
    flag_f: Option<String>,
    flag_t: Option<String>,
    flag_log: Option<String>,
}

impl Args {
    fn limit_overrides(&self) -> Vec<(LimitKind, &str)> {
        let flags = [
            (LimitKind::Processes, &self.flag_p),
            (LimitKind::DataSize, &self.flag_d),
            (LimitKind::StackSize, &self.flag_s),
            (LimitKind::OpenFiles, &self.flag_n),
            (LimitKind::FileSize, &self.flag_f),
            (LimitKind::CpuTime, &self.flag_t),
        ];

        flags
            .iter()
            .filter_map(|(kind, value)| value.as_ref().map(|v| (*kind, v.as_str())))
            .collect()
    }
}

fn main() {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    if args.flag_version {
        println!("sandbox version {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    init_logger(&args.flag_log);
    debug!("{:?}", args);

    let limits = ResourceLimits::from_overrides(args.limit_overrides())
        .unwrap_or_else(|e| display_error_and_exit(&e));

    match args.arg_command {
        Some(ref command) if args.flag_c => execute_from_command_string(limits, command),
        _ => execute_from_stdin(limits),
    }
}

fn init_logger(path: &Option<String>) {
    let log_path = match path.clone().map(PathBuf::from).or_else(default_log_path) {
        Some(log_path) => log_path,
        None => {
            eprintln!("sandbox: unable to find home directory, logging disabled");
            return;
        }
    };

    let pid = Pid::this();
    let result = fern::log_file(&log_path).map(|log_file| {
        fern::Dispatch::new()
            .format(move |out, message, record| {
                out.finish(format_args!(
                    "{} [{}] {}: {}",
                    pid,
                    record.level(),
                    record.target(),
                    message
                ))
            })
            .level(log::LevelFilter::Debug)
            .chain(log_file)
            .apply()
    });

    match result {
        Ok(Ok(())) => (),
        Ok(Err(e)) => eprintln!("sandbox: unable to install logger: {}", e),
        Err(e) => eprintln!(
            "sandbox: {}: {}, logging disabled",
            log_path.display(),
            e
        ),
    }
}

fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(LOG_FILE_NAME))
}

fn execute_from_command_string(limits: ResourceLimits, command: &str) -> ! {
    let mut shell = Shell::new(ShellConfig::noninteractive(limits));
    shell.execute_command_string(command);
    shell.exit(None)
}

fn execute_from_stdin(limits: ResourceLimits) -> ! {
    let mut shell = Shell::new(ShellConfig::interactive(limits));
    match shell.execute_from_stdin() {
        Ok(()) => shell.exit(None),
        Err(e) => {
            error!("unable to read input: {}", e);
            eprintln!("sandbox: {}", e);
            shell.exit(Some(FAILURE_EXIT_STATUS))
        }
    }
}

fn display_error_and_exit(error: &Error) -> ! {
    error!("failed to start shell: {}", error);
    eprintln!("sandbox: {}", error);
    process::exit(FAILURE_EXIT_STATUS);
}
