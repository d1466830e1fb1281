use std::{
    collections::hash_map::DefaultHasher,
    fmt::Display,
    hash::{Hash, Hasher},
    io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use serde::{Deserialize, Serialize};

use crate::error::OptError;

/// The stem shared by every file belonging to one optimization run
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

static JOB_COUNT: AtomicUsize = AtomicUsize::new(0);

impl JobId {
    /// A new id that will not collide with any other id generated in this
    /// process, and is very unlikely to collide with ids from other processes
    /// sharing the same directory
    pub fn random() -> Self {
        let mut s = DefaultHasher::new();
        std::process::id().hash(&mut s);
        jiff::Timestamp::now().as_nanosecond().hash(&mut s);
        JOB_COUNT.fetch_add(1, Ordering::Relaxed).hash(&mut s);
        Self(format!("{:016x}", s.finish()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One optimization run: a directory and an id. The only files `Job` touches
/// itself are the ones removed by [Job::clear_outputs].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    dir: PathBuf,
    id: JobId,
}

impl Job {
    pub fn new(dir: impl Into<PathBuf>, id: JobId) -> Self {
        Self {
            dir: dir.into(),
            id,
        }
    }

    /// A [Job] in `dir` with a [JobId::random] id
    pub fn random(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, JobId::random())
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `dir/id` with no extension. This is what MOPAC is called with
    pub fn basename(&self) -> PathBuf {
        self.dir.join(self.id.as_str())
    }

    fn with_ext(&self, ext: &str) -> PathBuf {
        let mut p = self.basename().into_os_string();
        p.push(".");
        p.push(ext);
        p.into()
    }

    /// the input deck
    pub fn deck(&self) -> PathBuf {
        self.with_ext("mop")
    }

    /// the structure MOPAC writes for PDBOUT
    pub fn result(&self) -> PathBuf {
        self.with_ext("pdb")
    }

    /// the file MOPAC polls for to stop early
    pub fn signal(&self) -> PathBuf {
        self.with_ext("end")
    }

    /// MOPAC's own output report
    pub fn report(&self) -> PathBuf {
        self.with_ext("out")
    }

    /// merged stdout and stderr of the optimizer process
    pub fn log(&self) -> PathBuf {
        self.with_ext("log")
    }

    /// Remove the result, signal and report files left by an earlier run with
    /// the same id. Files that do not exist are skipped
    pub fn clear_outputs(&self) -> Result<(), OptError> {
        for path in [self.result(), self.signal(), self.report()] {
            match std::fs::remove_file(&path) {
                Ok(()) => log::debug!("removed stale {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(OptError::Io(path.display().to_string(), e));
                }
            }
        }
        Ok(())
    }
}
