//! Running the optimizer as a child process under a wall-clock limit.
//!
//! When the limit expires the optimizer is asked to stop by writing `SHUT` to
//! the job's `.end` file, which MOPAC polls for. The process itself is never
//! killed; a killed MOPAC can leave a half-written structure behind.

use std::{
    fs::File,
    io,
    path::PathBuf,
    process::{Child, Command, ExitStatus, Stdio},
    sync::OnceLock,
    time::{Duration, Instant},
};

use regex::Regex;

use crate::{error::OptError, job::Job};

/// the contents of the shutdown signal file
pub const SHUTDOWN: &str = "SHUT";

/// how often to check on a running optimizer when there is a time limit
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// the executable used by [Mopac::from_env] when `MOPAC_CMD` is not set
pub const DEFAULT_MOPAC: &str = "/opt/mopac/mopac";

/// A program that can optimize a [Job]'s input deck
pub trait Runnable {
    /// a description of the program for error messages
    fn program(&self) -> String;

    /// Start the program on `job`, sending its standard output and standard
    /// error to `stdout` and `stderr`
    fn launch(
        &self,
        job: &Job,
        stdout: Stdio,
        stderr: Stdio,
    ) -> io::Result<Child>;

    /// Ask the program running `job` to stop early
    fn signal_shutdown(&self, job: &Job) -> io::Result<()> {
        std::fs::write(job.signal(), SHUTDOWN)
    }
}

/// MOPAC, called as `exe basename`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mopac {
    pub exe: PathBuf,
}

impl Mopac {
    pub fn new(exe: impl Into<PathBuf>) -> Self {
        Self { exe: exe.into() }
    }

    /// Use the executable named by the environment variable `MOPAC_CMD`, or
    /// [DEFAULT_MOPAC] if it is unset
    pub fn from_env() -> Self {
        match std::env::var_os("MOPAC_CMD") {
            Some(exe) => Self::new(exe),
            None => Self::new(DEFAULT_MOPAC),
        }
    }
}

impl Runnable for Mopac {
    fn program(&self) -> String {
        self.exe.display().to_string()
    }

    fn launch(
        &self,
        job: &Job,
        stdout: Stdio,
        stderr: Stdio,
    ) -> io::Result<Child> {
        log::debug!(
            "launching `{} {}`",
            self.exe.display(),
            job.basename().display()
        );
        Command::new(&self.exe)
            .arg(job.basename())
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The optimizer exited on its own. The exit status is informational; only
    /// the presence of a result file decides success
    Completed(ExitStatus),

    /// The time limit expired and the shutdown signal was written. The
    /// optimizer may still be running
    ShutdownRequested,
}

#[derive(Debug)]
pub struct RunReport {
    pub status: RunStatus,

    /// merged standard output and standard error of the optimizer, as far as
    /// it got before [run] returned
    pub output: String,
}

static LICENSE_CELL: OnceLock<Regex> = OnceLock::new();

fn license_re() -> &'static Regex {
    LICENSE_CELL.get_or_init(|| {
        Regex::new(concat!(
            r"is currently inaccessible\.\s+",
            r"Correct this fault before continuing \(FATAL\)"
        ))
        .unwrap()
    })
}

impl RunReport {
    /// Returns `true` if MOPAC reported that its license could not be found,
    /// either in the captured output or in `job`'s output report
    pub fn license_fault(&self, job: &Job) -> bool {
        let re = license_re();
        re.is_match(&self.output)
            || std::fs::read(job.report())
                .is_ok_and(|out| re.is_match(&String::from_utf8_lossy(&out)))
    }
}

/// Wait up to `limit` for `child` to exit. Returns `None` if it is still
/// running when the limit expires
fn wait_timeout(
    child: &mut Child,
    limit: Duration,
) -> io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let elapsed = start.elapsed();
        if elapsed >= limit {
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL.min(limit - elapsed));
    }
}

/// Run `runner` on `job`, blocking until it exits or `timeout` expires. With a
/// `timeout` of `None`, wait as long as it takes. On expiry, signal a shutdown,
/// log a warning naming `name`, and return immediately with
/// [RunStatus::ShutdownRequested]. Failing to start the program is an error;
/// timing out is not.
pub fn run<R: Runnable + ?Sized>(
    runner: &R,
    job: &Job,
    timeout: Option<Duration>,
    name: &str,
) -> Result<RunReport, OptError> {
    let log_path = job.log();
    let io_err = |e| OptError::Io(log_path.display().to_string(), e);
    let stdout = File::create(&log_path).map_err(io_err)?;
    let stderr = stdout.try_clone().map_err(io_err)?;

    let mut child = runner
        .launch(job, Stdio::from(stdout), Stdio::from(stderr))
        .map_err(|e| OptError::Launch(runner.program(), e))?;

    let wait_err = |e| OptError::Io(job.basename().display().to_string(), e);
    let status = match timeout {
        None => RunStatus::Completed(child.wait().map_err(wait_err)?),
        Some(limit) => match wait_timeout(&mut child, limit)
            .map_err(wait_err)?
        {
            Some(status) => RunStatus::Completed(status),
            None => {
                let signal = job.signal();
                runner.signal_shutdown(job).map_err(|e| {
                    OptError::Io(signal.display().to_string(), e)
                })?;
                log::warn!(
                    "optimization of {name} exceeded {:.1} s, \
                     requested shutdown with {}",
                    limit.as_secs_f64(),
                    signal.display()
                );
                RunStatus::ShutdownRequested
            }
        },
    };

    let output = std::fs::read(&log_path)
        .map(|b| String::from_utf8_lossy(&b).into_owned())
        .unwrap_or_default();
    Ok(RunReport { status, output })
}
