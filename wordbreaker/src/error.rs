use std::path::PathBuf;

/// Result type with [`Error`] as the default error
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can abort a run
///
/// None of these are retried. `Io`, `Format` and `Encoding` point at bad input files, the
/// remaining variants mean the lexicon bookkeeping is inconsistent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path:?}:{line}: {message}")]
    Format {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("cannot {0}")]
    Encoding(String),

    /// No known unit ends at `position` (a character offset into `text`)
    #[error("no segmentation of {text:?} reaches offset {position}")]
    Unsegmentable { text: String, position: usize },

    #[error("letter {0:?} is missing from the letter model")]
    UnknownLetter(char),

    #[error("unit {0:?} is missing from the lexicon")]
    UnknownEntry(String),

    #[error("{0:?} does not occur in the glossary")]
    UnknownWord(String),

    #[error("iteration {iteration} has no parse for corpus line {line}")]
    MissingParse { iteration: usize, line: usize },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}
