//! Error types for record extraction and corpus routing

/// Failure to turn one archive entry into a normalized document.
///
/// Returned per entry; the worker logs it and moves on to the next entry.
#[derive(Debug)]
pub enum ExtractError {
    /// Payload is not valid UTF-8
    Encoding(std::str::Utf8Error),
    /// Payload is not well-formed XML
    Xml { position: u64, message: String },
    /// Record has no `dokument` container
    MissingDocument,
    /// Serializing the normalized document failed
    Write(std::io::Error),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encoding(e) => write!(f, "payload is not UTF-8: {e}"),
            Self::Xml { position, message } => {
                write!(f, "malformed XML at byte {position}: {message}")
            }
            Self::MissingDocument => write!(f, "no <dokument> element in record"),
            Self::Write(e) => write!(f, "serialization failed: {e}"),
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encoding(e) => Some(e),
            Self::Write(e) => Some(e),
            Self::Xml { .. } | Self::MissingDocument => None,
        }
    }
}

impl From<std::io::Error> for ExtractError {
    fn from(e: std::io::Error) -> Self {
        Self::Write(e)
    }
}

/// Archive name whose prefix has no corpus assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCorpus(pub String);

impl std::fmt::Display for UnknownCorpus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' seems to be a new corpus (no entry in the corpus table)", self.0)
    }
}

impl std::error::Error for UnknownCorpus {}
