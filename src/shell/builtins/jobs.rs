use crate::shell::builtins::{self, prelude::*};

#[derive(Debug)]
pub struct Jobs;

impl builtins::BuiltinCommand for Jobs {
    const NAME: &'static str = builtins::JOBS_NAME;

    const HELP: &'static str = "\
jobs: jobs
    Display status of jobs.

    Removes background jobs that have finished, then lists the process ID
    and command line of each remaining job.";

    fn run<T: AsRef<str>>(shell: &mut Shell, _args: &[T], stdout: &mut dyn Write) -> Result<()> {
        shell.poll_and_list_jobs(stdout)
    }
}
