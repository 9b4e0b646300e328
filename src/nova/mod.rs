//! OpenStack Compute (Nova) implementation of the compute client contract.

mod error;
mod requests;
mod types;

use std::time::Duration;

use crate::compute::{ComputeClient, ComputeFuture, Server, ServerRequest, WaitPolicy};
use crate::config::ComputeConfig;
use types::ServerAction;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub use error::NovaClientError;

/// Client that drives servers through the OpenStack Compute REST API.
#[derive(Clone, Debug)]
pub struct NovaClient {
    http: reqwest::Client,
    endpoint: String,
    auth_token: String,
    policy: WaitPolicy,
}

impl NovaClient {
    /// Constructs a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`NovaClientError::Config`] when the configuration fails
    /// validation, and [`NovaClientError::Http`] when the HTTP client cannot
    /// be built.
    pub fn new(config: &ComputeConfig) -> Result<Self, NovaClientError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|err| NovaClientError::Http {
                url: config.endpoint.clone(),
                message: err.to_string(),
            })?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim().trim_end_matches('/').to_owned(),
            auth_token: config.auth_token.clone(),
            policy: config.wait_policy(),
        })
    }

    /// Overrides the polling policy taken from configuration.
    #[must_use]
    pub const fn with_wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn servers_url(&self) -> String {
        format!("{}/servers", self.endpoint)
    }

    fn server_url(&self, id: &str) -> String {
        format!("{}/servers/{id}", self.endpoint)
    }
}

impl ComputeClient for NovaClient {
    type Error = NovaClientError;

    fn create_server<'a>(
        &'a self,
        request: &'a ServerRequest,
    ) -> ComputeFuture<'a, Server, Self::Error> {
        Box::pin(async move {
            request.validate()?;
            let id = self.post_server(request).await?;
            self.fetch_server_body(&id)
                .await?
                .ok_or_else(|| NovaClientError::Status {
                    operation: String::from("create"),
                    status: reqwest::StatusCode::NOT_FOUND.as_u16(),
                    message: format!("server {id} vanished right after creation"),
                })
        })
    }

    fn fetch_server<'a>(&'a self, id: &'a str) -> ComputeFuture<'a, Option<Server>, Self::Error> {
        Box::pin(async move { self.fetch_server_body(id).await })
    }

    fn resize_server<'a>(
        &'a self,
        id: &'a str,
        flavor_ref: &'a str,
    ) -> ComputeFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.post_action(id, ServerAction::Resize { flavor_ref })
                .await
        })
    }

    fn confirm_resize<'a>(&'a self, id: &'a str) -> ComputeFuture<'a, (), Self::Error> {
        Box::pin(async move { self.post_action(id, ServerAction::ConfirmResize).await })
    }

    fn suspend_server<'a>(&'a self, id: &'a str) -> ComputeFuture<'a, (), Self::Error> {
        Box::pin(async move { self.post_action(id, ServerAction::Suspend).await })
    }

    fn resume_server<'a>(&'a self, id: &'a str) -> ComputeFuture<'a, (), Self::Error> {
        Box::pin(async move { self.post_action(id, ServerAction::Resume).await })
    }

    fn delete_server<'a>(&'a self, id: &'a str) -> ComputeFuture<'a, (), Self::Error> {
        Box::pin(async move { self.delete(id).await })
    }

    fn wait_policy(&self) -> WaitPolicy {
        self.policy
    }
}
