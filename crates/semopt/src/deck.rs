//! MOPAC input decks: a keyword line, a title line, a blank line, and one line
//! per atom with every coordinate flagged for optimization

use std::{
    fmt::Display,
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::{
    atom::Atom,
    error::OptError,
    job::Job,
    molecule::{Molecule, Structure},
    settings::Settings,
};


/// The optimization flag written after every coordinate
const OPT_FLAG: &str = "+1";

/// The contents of an input deck
#[derive(Clone, Debug, PartialEq)]
pub struct Deck {
    pub keywords: String,
    pub title: String,
    pub atoms: Vec<Atom>,
}

impl Deck {
    pub fn new(
        settings: &Settings,
        title: impl Into<String>,
        atoms: &[Atom],
    ) -> Self {
        Self {
            keywords: settings.keywords(),
            title: title.into(),
            atoms: atoms.to_vec(),
        }
    }

    /// the [Settings] encoded in the keyword line
    pub fn settings(&self) -> Result<Settings, OptError> {
        Settings::from_keywords(&self.keywords)
    }
}

impl Display for Deck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.keywords)?;
        writeln!(f, "{}\n", self.title)?;
        for atom in &self.atoms {
            writeln!(
                f,
                "{}   {} {OPT_FLAG}  {} {OPT_FLAG}  {} {OPT_FLAG}",
                atom.label(),
                atom.x,
                atom.y,
                atom.z,
            )?;
        }
        Ok(())
    }
}

impl FromStr for Deck {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s.lines();
        let (Some(keywords), Some(title), Some(_)) =
            (lines.next(), lines.next(), lines.next())
        else {
            return Err(OptError::Config(String::from(
                "input deck is missing its header",
            )));
        };
        let mut atoms = Vec::new();
        for line in lines.filter(|l| !l.trim().is_empty()) {
            let fields: Vec<_> = line.split_whitespace().collect();
            let [sym, x, _, y, _, z, _] = fields[..] else {
                return Err(OptError::Config(format!(
                    "bad atom line `{line}` in input deck"
                )));
            };
            let atom = format!("{sym} {x} {y} {z}")
                .parse::<Atom>()
                .map_err(|e| OptError::Config(e.to_string()))?;
            atoms.push(atom);
        }
        Ok(Self {
            keywords: keywords.to_owned(),
            title: title.to_owned(),
            atoms,
        })
    }
}

/// Write the input deck for `atoms` to `job`'s `.mop` file, titled with the
/// job's id, and return the path written. An existing file is overwritten
pub fn write(
    job: &Job,
    settings: &Settings,
    atoms: &[Atom],
) -> Result<PathBuf, OptError> {
    let path = job.deck();
    let deck = Deck::new(settings, job.id().as_str(), atoms);
    let mut file = File::create(&path)
        .map_err(|e| OptError::Io(path.display().to_string(), e))?;
    write!(file, "{deck}")
        .map_err(|e| OptError::Io(path.display().to_string(), e))?;
    Ok(path)
}

/// Like [write], but for a structure already exported to an XYZ or PDB file at
/// `structure`
pub fn write_from_file(
    job: &Job,
    settings: &Settings,
    structure: impl AsRef<Path>,
) -> Result<PathBuf, OptError> {
    let mol = Molecule::load(structure)?;
    write(job, settings, mol.atoms())
}
