use std::{error::Error, fmt::Display, io};

#[derive(Debug)]
pub enum OptError {
    /// failed to write or read one of the job's files
    Io(String, io::Error),

    /// the optimizer could not be started at all
    Launch(String, io::Error),

    /// the run finished, or was shut down, without leaving a result file
    Incomplete(String),

    /// the result file exists but could not be read as a structure
    Pdb(String),

    /// MOPAC refused to run because its license could not be found
    License(String),

    /// a settings file could not be loaded
    Config(String),
}

impl OptError {
    /// Returns `true` if the error is [`Incomplete`].
    ///
    /// [`Incomplete`]: OptError::Incomplete
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::Incomplete(..))
    }

    /// Returns `true` if the error is [`Launch`].
    ///
    /// [`Launch`]: OptError::Launch
    #[must_use]
    pub fn is_launch(&self) -> bool {
        matches!(self, Self::Launch(..))
    }
}

impl Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptError::Io(path, e) => write!(f, "i/o error on {path}: {e}"),
            OptError::Launch(exe, e) => {
                write!(f, "failed to launch {exe}: {e}")
            }
            OptError::Incomplete(path) => {
                write!(f, "optimization incomplete, {path} not found")
            }
            OptError::Pdb(msg) => write!(f, "failed to read result: {msg}"),
            OptError::License(path) => {
                write!(f, "MOPAC license inaccessible, see {path}")
            }
            OptError::Config(msg) => write!(f, "bad settings: {msg}"),
        }
    }
}

impl Error for OptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            OptError::Io(_, e) | OptError::Launch(_, e) => Some(e),
            _ => None,
        }
    }
}
