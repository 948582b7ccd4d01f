use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,
    #[error("address `{0}` has an empty domain")]
    EmptyDomain(String),
    #[error("address `{0}` has an empty localpart")]
    EmptyLocalpart(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("invalid room record: {0}")]
    InvalidRecord(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse snapshot {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("page numbers start at 1")]
    InvalidPage,
}
