//! Reading the structure MOPAC writes for the PDBOUT keyword. Only the atom
//! records are used; connectivity, residues, and everything else are ignored.
//! No checks are made on the chemistry of the result and hydrogens are kept.

use std::{io::ErrorKind, path::Path};

use crate::{atom::Atom, error::OptError};

/// the element symbol from columns 77-78, or failing that the leading letters
/// of the atom name in columns 13-16
fn element(line: &str) -> Option<&str> {
    if let Some(e) = line.get(76..78).map(str::trim)
        && !e.is_empty()
    {
        return Some(e);
    }
    let name = line.get(12..16)?.trim();
    let end = name
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(name.len());
    (end > 0).then(|| &name[..end])
}

fn parse_record(line: &str) -> Result<Atom, String> {
    let coord = |range: std::ops::Range<usize>| -> Result<f64, String> {
        let field = line
            .get(range)
            .ok_or_else(|| format!("record too short: `{line}`"))?
            .trim();
        field
            .parse()
            .map_err(|_| format!("bad coordinate `{field}` in `{line}`"))
    };
    let (x, y, z) = (coord(30..38)?, coord(38..46)?, coord(46..54)?);
    let sym =
        element(line).ok_or_else(|| format!("no element in `{line}`"))?;
    // atom names like CL1 are ambiguous without the element columns, so fall
    // back to a single letter
    Atom::new_from_label(sym, x, y, z)
        .or_else(|e| match sym.get(..1) {
            Some(s) if sym.len() > 1 => Atom::new_from_label(s, x, y, z),
            _ => Err(e),
        })
        .map_err(|e| e.to_string())
}

/// Parse the atoms out of the ATOM and HETATM records in `contents`, in file
/// order
pub fn parse(contents: &str) -> Result<Vec<Atom>, OptError> {
    let atoms = contents
        .lines()
        .filter(|l| l.starts_with("ATOM") || l.starts_with("HETATM"))
        .map(parse_record)
        .collect::<Result<Vec<_>, _>>()
        .map_err(OptError::Pdb)?;
    if atoms.is_empty() {
        return Err(OptError::Pdb(String::from("no atom records")));
    }
    Ok(atoms)
}

/// Read the atoms from the PDB file at `path`. A missing file is reported as
/// [OptError::Incomplete]
pub fn read(path: impl AsRef<Path>) -> Result<Vec<Atom>, OptError> {
    let path = path.as_ref();
    let contents = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(OptError::Incomplete(path.display().to_string()));
        }
        Err(e) => return Err(OptError::Io(path.display().to_string(), e)),
    };
    parse(&contents)
}
