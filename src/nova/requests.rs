//! HTTP request helpers for the Nova client.

use reqwest::header::ACCEPT;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::compute::{Server, ServerRequest};

use super::types::{CreateServerBody, CreatedServerEnvelope, ServerAction, ServerEnvelope};
use super::{NovaClient, NovaClientError};

const AUTH_HEADER: &str = "X-Auth-Token";

impl NovaClient {
    fn authorised(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header(AUTH_HEADER, &self.auth_token)
            .header(ACCEPT, "application/json")
    }

    async fn send(&self, builder: RequestBuilder, url: &str) -> Result<Response, NovaClientError> {
        self.authorised(builder)
            .send()
            .await
            .map_err(|err| NovaClientError::Http {
                url: url.to_owned(),
                message: err.to_string(),
            })
    }

    /// Issues `POST /servers` and returns the identifier of the new server.
    pub(super) async fn post_server(
        &self,
        request: &ServerRequest,
    ) -> Result<String, NovaClientError> {
        let url = self.servers_url();
        let body = CreateServerBody::from(request);
        let response = self.send(self.http.post(&url).json(&body), &url).await?;
        let created: CreatedServerEnvelope =
            decode("create", ensure_success("create", response).await?).await?;
        debug!(
            server_id = %created.server.id,
            name = %request.name,
            "server create accepted"
        );
        Ok(created.server.id)
    }

    /// Issues `GET /servers/{id}`, mapping `404` to `None`.
    pub(super) async fn fetch_server_body(
        &self,
        id: &str,
    ) -> Result<Option<Server>, NovaClientError> {
        let url = self.server_url(id);
        let response = self.send(self.http.get(&url), &url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let envelope: ServerEnvelope =
            decode("get", ensure_success("get", response).await?).await?;
        Ok(Some(Server::from(envelope.server)))
    }

    /// Issues `POST /servers/{id}/action` with the action body.
    pub(super) async fn post_action(
        &self,
        id: &str,
        action: ServerAction<'_>,
    ) -> Result<(), NovaClientError> {
        let url = format!("{}/action", self.server_url(id));
        let response = self
            .send(self.http.post(&url).json(&action.body()), &url)
            .await?;
        ensure_success(action.name(), response).await?;
        Ok(())
    }

    /// Issues `DELETE /servers/{id}`; a server that is already gone counts
    /// as deleted.
    pub(super) async fn delete(&self, id: &str) -> Result<(), NovaClientError> {
        let url = self.server_url(id);
        let response = self.send(self.http.delete(&url), &url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        ensure_success("delete", response).await?;
        Ok(())
    }
}

async fn ensure_success(operation: &str, response: Response) -> Result<Response, NovaClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(NovaClientError::Status {
        operation: operation.to_owned(),
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(
    operation: &str,
    response: Response,
) -> Result<T, NovaClientError> {
    let body = response
        .bytes()
        .await
        .map_err(|err| NovaClientError::Decode {
            operation: operation.to_owned(),
            message: err.to_string(),
        })?;
    serde_json::from_slice(&body).map_err(|err| NovaClientError::Decode {
        operation: operation.to_owned(),
        message: err.to_string(),
    })
}
