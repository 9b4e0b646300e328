//! Compute client contract used by the scenario driver.
//!
//! The driver never talks HTTP directly. It issues lifecycle calls through
//! [`ComputeClient`] and relies on the provided wait methods, which delegate
//! to the bounded polling primitive in [`crate::wait`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::wait;

/// Lifecycle status reported by the compute service for a server.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ServerStatus {
    /// The server is running.
    Active,
    /// The server is being built.
    Build,
    /// A resize is in progress.
    Resize,
    /// A resize finished and awaits confirmation or revert.
    VerifyResize,
    /// The server is suspended.
    Suspended,
    /// The server was deleted.
    Deleted,
    /// The server entered an error state.
    Error,
    /// Any status the crate does not name explicitly.
    Other(String),
}

impl ServerStatus {
    /// Returns the upper-case wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "ACTIVE",
            Self::Build => "BUILD",
            Self::Resize => "RESIZE",
            Self::VerifyResize => "VERIFY_RESIZE",
            Self::Suspended => "SUSPENDED",
            Self::Deleted => "DELETED",
            Self::Error => "ERROR",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServerStatus {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(value))
    }
}

impl From<&str> for ServerStatus {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Self::Active,
            "BUILD" => Self::Build,
            "RESIZE" => Self::Resize,
            "VERIFY_RESIZE" => Self::VerifyResize,
            "SUSPENDED" => Self::Suspended,
            "DELETED" => Self::Deleted,
            "ERROR" => Self::Error,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl Serialize for ServerStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ServerStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

/// Sizing profile reference attached to a server.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FlavorRef {
    /// Provider flavor identifier.
    pub id: String,
}

/// Read-only snapshot of a server as reported by the compute service.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Server {
    /// Opaque provider identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Current lifecycle status.
    pub status: ServerStatus,
    /// Flavor currently assigned to the server.
    pub flavor: FlavorRef,
    /// Task the service is still performing, if any.
    pub task_state: Option<String>,
}

impl Server {
    /// Returns true when the server reports `target` with no task in flight.
    #[must_use]
    pub fn has_settled_in(&self, target: &ServerStatus) -> bool {
        &self.status == target && self.task_state.is_none()
    }
}

/// Parameters required to boot a new server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerRequest {
    /// Name given to the server.
    pub name: String,
    /// Image used to boot the server.
    pub image_ref: String,
    /// Flavor the server is created with.
    pub flavor_ref: String,
}

impl ServerRequest {
    /// Starts a builder for a [`ServerRequest`].
    #[must_use]
    pub fn builder() -> ServerRequestBuilder {
        ServerRequestBuilder::new()
    }

    /// Validates the request, returning the first empty field.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Validation`] when any field is empty.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.name.is_empty() {
            return Err(RequestError::Validation("name".to_owned()));
        }
        if self.image_ref.is_empty() {
            return Err(RequestError::Validation("image_ref".to_owned()));
        }
        if self.flavor_ref.is_empty() {
            return Err(RequestError::Validation("flavor_ref".to_owned()));
        }
        Ok(())
    }
}

/// Builder for [`ServerRequest`] that trims inputs and validates on build.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ServerRequestBuilder {
    name: String,
    image_ref: String,
    flavor_ref: String,
}

impl ServerRequestBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server name.
    #[must_use]
    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.name = value.into();
        self
    }

    /// Sets the image reference.
    #[must_use]
    pub fn image_ref(mut self, value: impl Into<String>) -> Self {
        self.image_ref = value.into();
        self
    }

    /// Sets the flavor reference.
    #[must_use]
    pub fn flavor_ref(mut self, value: impl Into<String>) -> Self {
        self.flavor_ref = value.into();
        self
    }

    /// Builds and validates the [`ServerRequest`].
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Validation`] when any field is empty after
    /// trimming.
    pub fn build(self) -> Result<ServerRequest, RequestError> {
        let request = ServerRequest {
            name: self.name.trim().to_owned(),
            image_ref: self.image_ref.trim().to_owned(),
            flavor_ref: self.flavor_ref.trim().to_owned(),
        };
        request.validate()?;
        Ok(request)
    }
}

/// Errors raised while building requests.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RequestError {
    /// Raised when a request is missing a required field.
    #[error("missing or empty field: {0}")]
    Validation(String),
}

/// Interval and deadline used when polling for a server status.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WaitPolicy {
    /// Delay between two status fetches.
    pub interval: Duration,
    /// Total time allowed before the wait fails.
    pub timeout: Duration,
}

impl WaitPolicy {
    /// Default delay between polls.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
    /// Default overall deadline.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    /// Creates a policy from an interval and a timeout.
    #[must_use]
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL, Self::DEFAULT_TIMEOUT)
    }
}

/// Failures detected by the polling primitive.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum LifecycleError {
    /// The server does not exist (or no longer exists).
    #[error("server {server_id} not found")]
    NotFound {
        /// Provider identifier.
        server_id: String,
    },
    /// The target status was not reached before the deadline.
    #[error(
        "timed out waiting for server {server_id} to reach {target} (last status: {})",
        last_status.as_ref().map_or("unknown", ServerStatus::as_str)
    )]
    Timeout {
        /// Provider identifier.
        server_id: String,
        /// Status being waited for.
        target: ServerStatus,
        /// Last status observed, if any fetch succeeded.
        last_status: Option<ServerStatus>,
    },
    /// The server entered a terminal status other than the target.
    #[error("server {server_id} entered {status} while waiting for {target}")]
    Fault {
        /// Provider identifier.
        server_id: String,
        /// Status being waited for.
        target: ServerStatus,
        /// Terminal status reported.
        status: ServerStatus,
    },
    /// The server was still visible after the deletion deadline.
    #[error("server {server_id} still present after deletion")]
    Residual {
        /// Provider identifier.
        server_id: String,
    },
}

/// Future returned by compute client operations.
pub type ComputeFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Operations the scenario driver needs from a compute service.
pub trait ComputeClient: Send + Sync {
    /// Client specific error type.
    type Error: std::error::Error + From<LifecycleError> + Send + Sync + 'static;

    /// Boots a new server and returns its first snapshot.
    fn create_server<'a>(
        &'a self,
        request: &'a ServerRequest,
    ) -> ComputeFuture<'a, Server, Self::Error>;

    /// Fetches a server snapshot, returning `None` when it does not exist.
    fn fetch_server<'a>(&'a self, id: &'a str) -> ComputeFuture<'a, Option<Server>, Self::Error>;

    /// Requests a resize to `flavor_ref`.
    fn resize_server<'a>(
        &'a self,
        id: &'a str,
        flavor_ref: &'a str,
    ) -> ComputeFuture<'a, (), Self::Error>;

    /// Confirms a pending resize.
    fn confirm_resize<'a>(&'a self, id: &'a str) -> ComputeFuture<'a, (), Self::Error>;

    /// Suspends a running server.
    fn suspend_server<'a>(&'a self, id: &'a str) -> ComputeFuture<'a, (), Self::Error>;

    /// Resumes a suspended server.
    fn resume_server<'a>(&'a self, id: &'a str) -> ComputeFuture<'a, (), Self::Error>;

    /// Requests deletion of a server.
    fn delete_server<'a>(&'a self, id: &'a str) -> ComputeFuture<'a, (), Self::Error>;

    /// Polling policy used by the wait methods.
    fn wait_policy(&self) -> WaitPolicy;

    /// Fetches a server snapshot, failing when it does not exist.
    fn get_server<'a>(&'a self, id: &'a str) -> ComputeFuture<'a, Server, Self::Error> {
        Box::pin(async move {
            self.fetch_server(id).await.and_then(|found| {
                found.ok_or_else(|| {
                    Self::Error::from(LifecycleError::NotFound {
                        server_id: id.to_owned(),
                    })
                })
            })
        })
    }

    /// Blocks until the server settles in `target` or the policy expires.
    fn wait_for_server_status<'a>(
        &'a self,
        id: &'a str,
        target: &'a ServerStatus,
    ) -> ComputeFuture<'a, Server, Self::Error> {
        Box::pin(wait::wait_for_server_status(self, id, target))
    }

    /// Blocks until the server is no longer visible.
    fn wait_for_server_deletion<'a>(&'a self, id: &'a str) -> ComputeFuture<'a, (), Self::Error> {
        Box::pin(wait::wait_for_server_deletion(self, id))
    }
}
