//! Errors raised while a scenario drives a server.

use thiserror::Error;

/// Failures surfaced by a scenario body or its teardown.
#[derive(Debug, Error)]
pub enum ScenarioError<ClientError>
where
    ClientError: std::error::Error + 'static,
{
    /// Raised when the server cannot be created or never becomes `ACTIVE`.
    #[error("failed to provision server: {0}")]
    Provision(#[source] ClientError),
    /// Raised when a lifecycle call or a status wait fails.
    #[error("{action} failed on server {server_id}: {source}")]
    Action {
        /// Step that failed (for example `wait for VERIFY_RESIZE`).
        action: String,
        /// Provider identifier.
        server_id: String,
        /// Client error.
        #[source]
        source: ClientError,
    },
    /// Raised when deleting the scenario server fails.
    #[error("failed to delete server {server_id}: {source}")]
    Teardown {
        /// Provider identifier.
        server_id: String,
        /// Client error.
        #[source]
        source: ClientError,
    },
}
