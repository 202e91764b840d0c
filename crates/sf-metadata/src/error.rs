//! Error types for sf-metadata.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Returns true for failures raised while building or packaging,
    /// before anything is sent to the org.
    pub fn is_build_error(&self) -> bool {
        !matches!(self.kind, ErrorKind::Transport(_) | ErrorKind::Client(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("Unresolved placeholder {placeholder} in {path}")]
    UnresolvedPlaceholder { placeholder: String, path: String },
    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: String, reason: String },
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
    #[error("Template error: {0}")]
    Template(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("XML parse error: {0}")]
    Xml(String),
    #[error("Archive error: {0}")]
    Archive(String),
    #[error("Client error: {0}")]
    Client(String),
    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<busbar_sf_client::Error> for Error {
    fn from(err: busbar_sf_client::Error) -> Self {
        let kind = if err.is_transport() {
            ErrorKind::Transport(err.to_string())
        } else {
            ErrorKind::Client(err.to_string())
        };
        Error {
            kind,
            source: Some(Box::new(err)),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error {
            kind: ErrorKind::Io(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error {
            kind: ErrorKind::Archive(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error {
            kind: ErrorKind::Xml(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::InvalidPayload(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}
