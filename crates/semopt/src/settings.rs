//! Run options for a MOPAC optimization and the keyword line built from them

use std::{fs::read_to_string, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::OptError;


/// The options for a single optimization. Every field has a default, so a
/// partial TOML table or a [Settings::with_overrides] call always yields a
/// complete set.
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
#[serde(default)]
pub struct Settings {
    /// The semi-empirical Hamiltonian, like PM7, PM6, AM1, or RM1.
    pub hamiltonian: String,

    /// The calculation type. OPT optimizes the geometry, while values like
    /// 1SCF or TS are passed through as-is.
    pub method: String,

    /// The gradient norm convergence criterion in kcal/mol/Å. Only written
    /// when `method` is OPT.
    pub gradient: f64,

    /// Dielectric constant for the COSMO solvent model. 80.1 approximates
    /// water at room temperature; 0 disables the solvent model in MOPAC.
    pub eps: f64,

    /// The molecular charge.
    pub charge: isize,

    /// The keyword selecting the structure file MOPAC writes on completion.
    pub fileout: String,

    /// Wall-clock limit on the run in seconds. Zero disables the limit.
    pub timeout: f64,

    /// Any other keys in the table. These are kept but never used.
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hamiltonian: String::from("PM7"),
            method: String::from("OPT"),
            gradient: 0.01,
            eps: 80.1,
            charge: 0,
            fileout: String::from("PDBOUT"),
            timeout: 172800.0,
            extra: toml::Table::new(),
        }
    }
}

macro_rules! builders {
    ($($name:ident: $t:ty$(,)*)*) => {
        $(pub fn $name(mut self, v: $t) -> Self {
            self.$name = v.into();
            self
        })*
    }
}

impl Settings {
    /// Load settings from the TOML file at `path`, backfilling defaults for any
    /// missing keys
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OptError> {
        let path = path.as_ref();
        let contents = read_to_string(path)
            .map_err(|e| OptError::Io(path.display().to_string(), e))?;
        toml::from_str(&contents).map_err(|e| {
            OptError::Config(format!("{}: {e}", path.display()))
        })
    }

    /// Merge `overrides` over the defaults. Values in `overrides` win
    pub fn with_overrides(overrides: toml::Table) -> Result<Self, OptError> {
        toml::Value::Table(overrides)
            .try_into()
            .map_err(|e| OptError::Config(e.to_string()))
    }

    builders! {
        hamiltonian: &str,
        method: &str,
        gradient: f64,
        eps: f64,
        charge: isize,
        fileout: &str,
        timeout: f64,
    }

    /// The wall-clock limit as a [Duration], or `None` if the limit is
    /// disabled. Anything that is not a positive number of seconds small
    /// enough to fit in a [Duration] disables it.
    pub fn wall_time(&self) -> Option<Duration> {
        if self.timeout > 0.0 {
            Duration::try_from_secs_f64(self.timeout).ok()
        } else {
            None
        }
    }

    /// The first line of the MOPAC input deck. LET is always included so that
    /// MOPAC does not stop on warnings.
    pub fn keywords(&self) -> String {
        let gnorm = if self.method == "OPT" {
            format!(" GNORM={} ", self.gradient)
        } else {
            String::new()
        };
        format!(
            "{} {}{gnorm} EPS={}  CHARGE={}  {} LET ",
            self.hamiltonian, self.method, self.eps, self.charge, self.fileout
        )
    }

    /// Recover settings from a keyword line written by [Settings::keywords].
    /// The first two tokens are the Hamiltonian and method, `KEY=value` tokens
    /// fill in the numeric options, and the last bare token is the output
    /// keyword. Options not on the line keep their defaults.
    pub fn from_keywords(line: &str) -> Result<Self, OptError> {
        let mut ret = Self::default();
        let mut tokens = line.split_whitespace();
        let (Some(ham), Some(method)) = (tokens.next(), tokens.next()) else {
            return Err(OptError::Config(format!(
                "keyword line `{line}` is too short"
            )));
        };
        ret.hamiltonian = ham.to_owned();
        ret.method = method.to_owned();
        let bad = |t: &str| OptError::Config(format!("bad keyword `{t}`"));
        for token in tokens {
            match token.split_once('=') {
                Some(("GNORM", v)) => {
                    ret.gradient = v.parse().map_err(|_| bad(token))?
                }
                Some(("EPS", v)) => {
                    ret.eps = v.parse().map_err(|_| bad(token))?
                }
                Some(("CHARGE", v)) => {
                    ret.charge = v.parse().map_err(|_| bad(token))?
                }
                Some(_) => return Err(bad(token)),
                None if token == "LET" => {}
                None => ret.fileout = token.to_owned(),
            }
        }
        Ok(ret)
    }
}
