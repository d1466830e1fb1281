//! Geometry optimization of molecules with MOPAC.
//!
//! An optimization runs in three strictly ordered phases: the input deck is
//! written, MOPAC is run on it under an optional time limit, and the structure
//! MOPAC leaves behind replaces the molecule's geometry. All of a run's files
//! share the basename of its [Job] and are left on disk afterwards.

use std::path::Path;

pub mod atom;
pub mod deck;
pub mod error;
pub mod job;
pub mod molecule;
pub mod pdb;
pub mod runner;
pub mod settings;

#[cfg(test)]
mod tests;

pub use atom::Atom;
pub use error::OptError;
pub use job::{Job, JobId};
pub use molecule::{Molecule, Structure};
pub use runner::{Mopac, RunStatus, Runnable};
pub use settings::Settings;

/// Read the structure MOPAC wrote for `job` and make it `mol`'s geometry.
/// Returns the geometry it replaced.
///
/// If there is no result file, [OptError::Incomplete] is returned and `mol`
/// is left exactly as it was. The same holds for a result file that cannot be
/// parsed.
pub fn import<S: Structure + ?Sized>(
    mol: &mut S,
    job: &Job,
) -> Result<Vec<Atom>, OptError> {
    log::info!("updating {} with optimized geometry", mol.name());
    let atoms = pdb::read(job.result())?;
    Ok(mol.replace_atoms(atoms))
}

/// Optimize `mol` by running `runner` on an input deck built from `settings`,
/// with all files named after `job`. Result, signal and report files left by an
/// earlier run of the same job are removed before MOPAC starts.
///
/// A run that hits the time limit is not an error by itself: the shutdown
/// signal is written, and if MOPAC flushed a structure before this returns it
/// is used. Otherwise the result is [OptError::Incomplete] and `mol` is
/// unchanged.
pub fn optimize<S, R>(
    mol: &mut S,
    runner: &R,
    settings: &Settings,
    job: &Job,
) -> Result<RunStatus, OptError>
where
    S: Structure + ?Sized,
    R: Runnable + ?Sized,
{
    log::info!("creating input deck for {}", mol.name());
    let deck = deck::write(job, settings, mol.atoms())?;
    job.clear_outputs()?;

    log::info!(
        "{} running {} on {}",
        jiff::Timestamp::now(),
        runner.program(),
        deck.display()
    );
    let report = runner::run(runner, job, settings.wall_time(), mol.name())?;
    if report.license_fault(job) {
        return Err(OptError::License(job.report().display().to_string()));
    }

    import(mol, job)?;
    Ok(report.status)
}

/// [optimize] with a fresh [JobId::random] job in `dir`. Returns the job so the
/// caller can find its files
pub fn optimize_in<S, R>(
    mol: &mut S,
    runner: &R,
    settings: &Settings,
    dir: impl AsRef<Path>,
) -> Result<(Job, RunStatus), OptError>
where
    S: Structure + ?Sized,
    R: Runnable + ?Sized,
{
    let job = Job::random(dir.as_ref());
    let status = optimize(mol, runner, settings, &job)?;
    Ok((job, status))
}
