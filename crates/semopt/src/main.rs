use std::path::PathBuf;

use clap::Parser;
use semopt::{Job, JobId, Molecule, Mopac, RunStatus, Runnable, Settings};

/// log an error and exit with status 1
macro_rules! die {
    ($($t:tt)*) => {{
        log::error!($($t)*);
        std::process::exit(1);
    }};
}

/// optimize a molecule with MOPAC
#[derive(Parser, Debug)]
#[command(author, about, long_about = None)]
struct Args {
    /// The molecule to optimize, as an XYZ file or a PDB file ending in .pdb
    molecule: PathBuf,

    /// TOML file of settings overriding the defaults (PM7 OPT GNORM=0.01
    /// EPS=80.1 CHARGE=0 PDBOUT, 172800 s timeout)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// The MOPAC executable. Defaults to $MOPAC_CMD, or /opt/mopac/mopac if
    /// that is unset
    #[arg(short, long)]
    mopac: Option<PathBuf>,

    /// The directory in which to write the job files
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Name the job files after this instead of a random id
    #[arg(long)]
    job_id: Option<String>,

    /// Write the optimized geometry to this XYZ file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the merged settings as JSON and exit
    #[arg(short, long, default_value_t = false)]
    json: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => match Settings::load(path) {
            Ok(s) => s,
            Err(e) => die!("failed to load settings: {e}"),
        },
        None => Settings::default(),
    };
    if args.json {
        match serde_json::to_string_pretty(&settings) {
            Ok(s) => println!("{s}"),
            Err(e) => die!("failed to serialize settings with {e}"),
        }
        return;
    }

    let mopac = args.mopac.map(Mopac::new).unwrap_or_else(Mopac::from_env);
    let mut mol = match Molecule::load(&args.molecule) {
        Ok(mol) => mol,
        Err(e) => die!("failed to load molecule: {e}"),
    };
    let id = args.job_id.map(JobId::from).unwrap_or_else(JobId::random);
    let job = Job::new(&args.dir, id);

    match semopt::optimize(&mut mol, &mopac, &settings, &job) {
        Ok(RunStatus::Completed(status)) => {
            log::info!("{} finished with {status}", mopac.program())
        }
        Ok(RunStatus::ShutdownRequested) => {
            log::info!("using the geometry written before shutdown")
        }
        Err(e) => die!("optimization of {} failed: {e}", mol.name),
    }

    match args.output {
        Some(path) => {
            if let Err(e) = mol.write_xyz(&path) {
                die!("failed to write {}: {e}", path.display())
            }
        }
        None => print!("{mol}"),
    }
}
