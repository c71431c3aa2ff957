// Error types for the Waypost router

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid number of arguments on try define route {route}: expected 2, got {count}.")]
    InvalidArgumentArity { route: String, count: usize },

    #[error("Route name already in use: {0}")]
    DuplicateRouteName(String),

    #[error("Prefix is enabled for route group {0} but no prefix is configured")]
    MissingGroupPrefix(String),

    #[error("Failed on try add route {0}: registration is closed")]
    RegistrationClosed(String),

    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("Invalid setting: {0}")]
    Settings(String),

    #[error("Unresolved route action: {0}")]
    UnresolvedAction(String),

    #[error("Route discovery error: {0}")]
    Discovery(String),

    #[error("Missing handler argument: {0}")]
    MissingArgument(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NotFound(_) => 404,
            Error::BadRequest(_) | Error::Deserialization(_) | Error::MissingArgument(_) => 400,
            _ => 500,
        }
    }

    /// Check if this error was raised while building the route table.
    ///
    /// Bootstrap errors are not recoverable by the router and are expected to
    /// abort startup.
    pub fn is_bootstrap_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgumentArity { .. }
                | Error::DuplicateRouteName(_)
                | Error::MissingGroupPrefix(_)
                | Error::RegistrationClosed(_)
                | Error::Settings(_)
        )
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

pub type Result<T> = std::result::Result<T, Error>;
