use std::fmt;

/// Failure that prevents producing any valid layout or document. Everything
/// recoverable (a missing image, an oversized block) is absorbed upstream and
/// never surfaces through this type.
#[derive(Debug)]
pub enum ReportError {
    EmptyDocument,
    InvalidConfiguration(String),
    Font(String),
    Sink(String),
    Io(std::io::Error),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::EmptyDocument => write!(f, "report document has no content"),
            ReportError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            ReportError::Font(message) => write!(f, "font error: {}", message),
            ReportError::Sink(message) => write!(f, "sink error: {}", message),
            ReportError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReportError {
    fn from(value: std::io::Error) -> Self {
        ReportError::Io(value)
    }
}
