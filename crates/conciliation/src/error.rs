use std::fmt;

#[derive(Debug)]
pub enum ConciliationError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad filter, empty procedure code, etc.).
    ConfigValidation(String),
    /// Missing required column in input data.
    MissingColumn { source: String, column: String },
    /// Amount parse error.
    AmountParse { source: String, record_id: String, value: String },
    /// Patient age parse error.
    AgeParse { source: String, record_id: String, value: String },
    /// IO error (file read, CSV framing, etc.).
    Io(String),
}

impl fmt::Display for ConciliationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { source, column } => {
                write!(f, "{source}: missing column '{column}'")
            }
            Self::AmountParse { source, record_id, value } => {
                write!(f, "{source}, record '{record_id}': cannot parse amount '{value}'")
            }
            Self::AgeParse { source, record_id, value } => {
                write!(f, "{source}, record '{record_id}': cannot parse patient age '{value}'")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ConciliationError {}
