use stockwatch_core::messages::CatalogError;
use stockwatch_core::{PersistenceError, RetrievalError, ServiceError};
use stockwatch_warehouse::WarehouseError;
use thiserror::Error;

/// Process exit codes.
pub const EXIT_OK: i32 = 0;
pub const EXIT_INVALID: i32 = 2;
pub const EXIT_NOT_FOUND: i32 = 3;
pub const EXIT_RETRIEVAL: i32 = 6;
pub const EXIT_FAILURE: i32 = 10;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("invalid input: {0}")]
    Input(String),

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Input(_) | Self::Serialization(_) => EXIT_INVALID,
            Self::Retrieval(_) => EXIT_RETRIEVAL,
            Self::Config(_) | Self::Catalog(_) | Self::Warehouse(_) | Self::Io(_) => EXIT_FAILURE,
        }
    }
}

/// Exit code for a service failure that was reported as a message.
pub const fn service_exit_code(error: &ServiceError) -> i32 {
    match error {
        ServiceError::Validation(_) => EXIT_INVALID,
        ServiceError::Persistence(PersistenceError::ObjectUnchanged { .. }) => EXIT_OK,
        ServiceError::Persistence(PersistenceError::NotFound { .. }) => EXIT_NOT_FOUND,
        ServiceError::Persistence(_) => EXIT_FAILURE,
    }
}
