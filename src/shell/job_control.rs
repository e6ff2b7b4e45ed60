use std::fmt;
use std::io::{self, Write};

use log::{debug, info};
use nix::unistd::Pid;

use super::process::ProcessControl;
use crate::errors::Result;

/// A background process and the command line that started it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    pid: Pid,
    argv: Vec<String>,
}

impl Job {
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}  - {}", self.pid.as_raw(), self.argv.join(" "))
    }
}

/// Background jobs in the order they were started.
///
/// Only the shell's control thread touches the table, between prompts.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: Vec<Job>,
}

impl JobTable {
    /// Records a newly started background process. `argv` is owned by the
    /// table from here on.
    pub fn register(&mut self, pid: Pid, argv: Vec<String>) {
        debug!("registering job {}", pid);
        self.jobs.push(Job { pid, argv });
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Polls every job without blocking and removes the ones that have
    /// finished. Returns the removed jobs.
    ///
    /// A job whose poll fails is kept and checked again next time.
    pub fn reap(&mut self, control: &mut dyn ProcessControl) -> Vec<Job> {
        let mut finished = Vec::new();
        let mut i = 0;
        while i < self.jobs.len() {
            let result = control.poll(self.jobs[i].pid);
            log_if_err!(result, "failed to poll job {}", self.jobs[i].pid);
            match result {
                Ok(status) if status.is_finished() => {
                    let job = self.jobs.remove(i);
                    debug!("job {} {}", job.pid, status);
                    finished.push(job);
                }
                _ => i += 1,
            }
        }
        finished
    }

    /// Writes the job count followed by one line per job.
    pub fn list(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{} jobs.", self.jobs.len())?;
        for job in &self.jobs {
            writeln!(out, "{}", job)?;
        }
        Ok(())
    }

    /// Removes finished jobs, then lists the rest.
    pub fn poll_and_list(
        &mut self,
        control: &mut dyn ProcessControl,
        out: &mut dyn Write,
    ) -> Result<()> {
        self.reap(control);
        self.list(out)?;
        Ok(())
    }

    /// Sends a termination request to every remaining job and empties the
    /// table. Safe to call more than once.
    pub fn teardown(&mut self, control: &mut dyn ProcessControl) {
        if !self.jobs.is_empty() {
            info!("terminating {} background jobs", self.jobs.len());
        }
        for job in self.jobs.drain(..) {
            let result = control.terminate(job.pid);
            log_if_err!(result, "failed to terminate job {}", job.pid);
        }
    }
}
