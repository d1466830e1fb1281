use std::{fmt::Display, fs::read_to_string, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{atom::Atom, error::OptError, pdb};

/// What an optimization needs from a molecule: a name for diagnostics, its
/// current geometry, and a way to hand it a new one
pub trait Structure {
    fn name(&self) -> &str;

    /// the current geometry in the molecule's native atom order
    fn atoms(&self) -> &[Atom];

    /// take ownership of `atoms` as the new geometry and return the old one
    fn replace_atoms(&mut self, atoms: Vec<Atom>) -> Vec<Atom>;
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Molecule {
    pub name: String,
    atoms: Vec<Atom>,
}

impl Structure for Molecule {
    fn name(&self) -> &str {
        &self.name
    }

    fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    fn replace_atoms(&mut self, atoms: Vec<Atom>) -> Vec<Atom> {
        std::mem::replace(&mut self.atoms, atoms)
    }
}

/// XYZ format. Coordinates are written in full so that reading the file back
/// gives the same values
impl Display for Molecule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.atoms.len())?;
        writeln!(f, "{}", self.name)?;
        for atom in &self.atoms {
            writeln!(f, "{:2} {} {} {}", atom.label(), atom.x, atom.y, atom.z)?;
        }
        Ok(())
    }
}

impl FromStr for Molecule {
    type Err = OptError;

    /// parse an XYZ file. The atom count and comment lines are optional; when
    /// present the comment becomes the name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s.lines().filter(|l| !l.trim().is_empty()).peekable();
        let mut name = String::new();
        let mut count = None;
        if let Some(first) = lines.peek()
            && let Ok(n) = first.trim().parse::<usize>()
        {
            count = Some(n);
            lines.next();
            // the comment line may be blank, in which case it was filtered and
            // this is the first atom
            if let Some(comment) = lines.next_if(|l| l.parse::<Atom>().is_err())
            {
                name = comment.trim().to_owned();
            }
        }
        let atoms = lines
            .map(|l| l.parse())
            .collect::<Result<Vec<Atom>, _>>()
            .map_err(|e| OptError::Config(e.to_string()))?;
        if let Some(n) = count
            && n != atoms.len()
        {
            return Err(OptError::Config(format!(
                "expected {n} atoms, found {}",
                atoms.len()
            )));
        }
        Ok(Self { name, atoms })
    }
}

impl Molecule {
    pub fn new(name: impl Into<String>, atoms: Vec<Atom>) -> Self {
        Self {
            name: name.into(),
            atoms,
        }
    }

    /// Load a molecule from an XYZ file, or a PDB file if `path` ends in
    /// `.pdb`. If the file does not provide a name, the file stem is used
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OptError> {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut mol = if path.extension().is_some_and(|e| e == "pdb") {
            Self::new(String::new(), pdb::read(path)?)
        } else {
            let contents = read_to_string(path)
                .map_err(|e| OptError::Io(path.display().to_string(), e))?;
            contents.parse()?
        };
        if mol.name.is_empty() {
            mol.name = stem;
        }
        Ok(mol)
    }

    /// export the current geometry to `path` in XYZ format
    pub fn write_xyz(&self, path: impl AsRef<Path>) -> Result<(), OptError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_string())
            .map_err(|e| OptError::Io(path.display().to_string(), e))
    }
}
