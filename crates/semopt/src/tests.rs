use std::{
    io,
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    sync::atomic::{AtomicUsize, Ordering},
    time::{Duration, Instant},
};

use approx::assert_abs_diff_eq;
use tempfile::TempDir;

use crate::*;

/// A fake optimizer: a shell script run as `sh script basename`
pub(crate) struct Script {
    path: PathBuf,
}

impl Script {
    pub(crate) fn new(dir: &Path, body: &str) -> Self {
        static COUNT: AtomicUsize = AtomicUsize::new(0);
        let n = COUNT.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(format!("fake{n}.sh"));
        std::fs::write(&path, body).unwrap();
        Self { path }
    }
}

impl Runnable for Script {
    fn program(&self) -> String {
        format!("sh {}", self.path.display())
    }

    fn launch(
        &self,
        job: &Job,
        stdout: Stdio,
        stderr: Stdio,
    ) -> io::Result<Child> {
        Command::new("sh")
            .arg(&self.path)
            .arg(job.basename())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
    }
}

fn benzene_pdb() -> String {
    format!("{}/testfiles/benzene.pdb", env!("CARGO_MANIFEST_DIR"))
}

/// benzene from the test file, squashed along x
fn start() -> Molecule {
    let atoms = pdb::read(benzene_pdb())
        .unwrap()
        .into_iter()
        .map(|a| Atom { x: a.x * 0.5, ..a })
        .collect();
    Molecule::new("benzene", atoms)
}

fn test_job() -> (TempDir, Job) {
    let dir = TempDir::new().unwrap();
    let job = Job::new(dir.path(), "benzene".into());
    (dir, job)
}

#[test]
fn optimize_replaces_geometry() {
    let (dir, job) = test_job();
    let script = Script::new(
        dir.path(),
        &format!(
            "test -f \"$1.mop\" || exit 1\ncp {} \"$1.pdb\"",
            benzene_pdb()
        ),
    );
    let mut mol = start();
    let got = optimize(&mut mol, &script, &Settings::default(), &job).unwrap();
    assert!(matches!(got, RunStatus::Completed(s) if s.success()));
    assert_eq!(mol.atoms(), pdb::read(benzene_pdb()).unwrap());
    assert_eq!(mol.name, "benzene");
    assert_abs_diff_eq!(mol.atoms()[0], Atom::new(6, 1.3915, -0.0004, 0.0001));
    assert!(job.deck().exists());
}

#[test]
fn missing_result_keeps_geometry() {
    let (dir, job) = test_job();
    let script = Script::new(dir.path(), "true");
    let mut mol = start();
    let got = optimize(&mut mol, &script, &Settings::default(), &job);
    assert!(got.is_err_and(|e| e.is_incomplete()));
    assert_eq!(mol, start());
}

#[test]
fn unreadable_result_keeps_geometry() {
    let (dir, job) = test_job();
    let script = Script::new(dir.path(), "echo garbage > \"$1.pdb\"");
    let mut mol = start();
    let got = optimize(&mut mol, &script, &Settings::default(), &job);
    assert!(matches!(got, Err(OptError::Pdb(_))));
    assert_eq!(mol, start());
}

#[test]
fn timeout_without_result() {
    let (dir, job) = test_job();
    // a well-behaved optimizer that only writes its result after being told
    // to stop, which is too late
    let script = Script::new(
        dir.path(),
        &format!(
            "while [ ! -f \"$1.end\" ]; do sleep 0.1; done\n\
             sleep 1\ncp {} \"$1.pdb\"",
            benzene_pdb()
        ),
    );
    let mut mol = start();
    let settings = Settings::default().timeout(0.2);
    let start_time = Instant::now();
    let got = optimize(&mut mol, &script, &settings, &job);
    assert!(start_time.elapsed() < Duration::from_secs(1));
    assert!(got.is_err_and(|e| e.is_incomplete()));
    assert_eq!(std::fs::read_to_string(job.signal()).unwrap(), "SHUT");
    assert_eq!(mol, start());
}

#[test]
fn timeout_with_partial_result() {
    let (dir, job) = test_job();
    let script = Script::new(
        dir.path(),
        &format!("cp {} \"$1.pdb\"\nsleep 5", benzene_pdb()),
    );
    let mut mol = start();
    let settings = Settings::default().timeout(0.5);
    let got = optimize(&mut mol, &script, &settings, &job).unwrap();
    assert_eq!(got, RunStatus::ShutdownRequested);
    assert_eq!(mol.atoms(), pdb::read(benzene_pdb()).unwrap());
}

#[test]
fn license_fault() {
    let (dir, job) = test_job();
    let script = Script::new(
        dir.path(),
        &format!(
            "echo 'MOPAC license is currently inaccessible.   Correct this \
             fault before continuing (FATAL)'\ncp {} \"$1.pdb\"",
            benzene_pdb()
        ),
    );
    let mut mol = start();
    let got = optimize(&mut mol, &script, &Settings::default(), &job);
    assert!(matches!(got, Err(OptError::License(_))));
    assert_eq!(mol, start());
}

#[test]
fn rerun_ignores_stale_files() {
    let (dir, job) = test_job();
    let script =
        Script::new(dir.path(), &format!("cp {} \"$1.pdb\"", benzene_pdb()));
    let mut mol = start();
    optimize(&mut mol, &script, &Settings::default(), &job).unwrap();
    let first = mol.clone();

    // leftovers that would otherwise stop the rerun early or fail it
    std::fs::write(job.signal(), "SHUT").unwrap();
    std::fs::write(
        job.report(),
        "is currently inaccessible.   Correct this fault before continuing \
         (FATAL)",
    )
    .unwrap();

    let script = Script::new(dir.path(), "true");
    let got = optimize(&mut mol, &script, &Settings::default(), &job);
    assert!(got.is_err_and(|e| e.is_incomplete()));
    assert_eq!(mol, first);
    assert!(!job.signal().exists());
    assert!(!job.report().exists());
}

#[test]
fn launch_failure_propagates() {
    let (_dir, job) = test_job();
    let mut mol = start();
    let mopac = Mopac::new("/nonexistent/mopac");
    let got = optimize(&mut mol, &mopac, &Settings::default(), &job);
    assert!(got.is_err_and(|e| e.is_launch()));
    // the deck is always written before anything is launched
    assert!(job.deck().exists());
    assert_eq!(mol, start());
}

#[test]
fn optimize_in_random_job() {
    let dir = TempDir::new().unwrap();
    let script =
        Script::new(dir.path(), &format!("cp {} \"$1.pdb\"", benzene_pdb()));
    let mut mol = start();
    let (job, status) =
        optimize_in(&mut mol, &script, &Settings::default(), dir.path())
            .unwrap();
    assert!(matches!(status, RunStatus::Completed(_)));
    assert_eq!(job.dir(), dir.path());
    assert!(job.deck().exists());
    assert!(job.result().exists());
    assert!(job.log().exists());
}

#[test]
fn import_returns_old_geometry() {
    let (_dir, job) = test_job();
    std::fs::copy(benzene_pdb(), job.result()).unwrap();
    let mut mol = start();
    let old = import(&mut mol, &job).unwrap();
    assert_eq!(old, start().atoms());
    assert_eq!(mol.atoms().len(), 12);
}
