use std::fmt;

/// Errors reported by the fallible scheduler operations.
///
/// Invalid task handles are never an error: operations on them are silent
/// no-ops. Only resource exhaustion and setup problems surface here.
#[derive(Debug)]
pub enum Error {
    /// No free task slot or schedule node was available.
    ResourceExhausted,
    /// A configuration value is outside its accepted range.
    InvalidConfig(String),
    /// An interval or delay string could not be parsed.
    InvalidInterval(String),
    /// Loading or deserializing configuration failed.
    Config(config::ConfigError),
    /// The host driver task failed.
    Runtime(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ResourceExhausted => write!(f, "no free task slot or schedule node"),
            Error::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            Error::InvalidInterval(value) => write!(f, "invalid interval value: {}", value),
            Error::Config(e) => write!(f, "config error: {}", e),
            Error::Runtime(msg) => write!(f, "runtime error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Config(e)
    }
}
