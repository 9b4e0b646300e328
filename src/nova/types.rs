//! Wire representations for the OpenStack Compute API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::compute::{FlavorRef, Server, ServerRequest, ServerStatus};

#[derive(Serialize)]
pub(super) struct CreateServerBody<'a> {
    pub(super) server: CreateServer<'a>,
}

#[derive(Serialize)]
pub(super) struct CreateServer<'a> {
    pub(super) name: &'a str,
    #[serde(rename = "imageRef")]
    pub(super) image_ref: &'a str,
    #[serde(rename = "flavorRef")]
    pub(super) flavor_ref: &'a str,
}

impl<'a> From<&'a ServerRequest> for CreateServerBody<'a> {
    fn from(request: &'a ServerRequest) -> Self {
        Self {
            server: CreateServer {
                name: &request.name,
                image_ref: &request.image_ref,
                flavor_ref: &request.flavor_ref,
            },
        }
    }
}

/// `POST /servers` only echoes the identifier (plus links and the admin
/// password, which are ignored).
#[derive(Deserialize)]
pub(super) struct CreatedServerEnvelope {
    pub(super) server: CreatedServer,
}

#[derive(Deserialize)]
pub(super) struct CreatedServer {
    pub(super) id: String,
}

#[derive(Deserialize)]
pub(super) struct ServerEnvelope {
    pub(super) server: ServerBody,
}

#[derive(Deserialize)]
pub(super) struct ServerBody {
    id: String,
    #[serde(default)]
    name: String,
    status: ServerStatus,
    flavor: FlavorRef,
    #[serde(rename = "OS-EXT-STS:task_state", default)]
    task_state: Option<String>,
}

impl From<ServerBody> for Server {
    fn from(body: ServerBody) -> Self {
        Self {
            id: body.id,
            name: body.name,
            status: body.status,
            flavor: body.flavor,
            task_state: body.task_state,
        }
    }
}

/// Body of a `POST /servers/{id}/action` request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum ServerAction<'a> {
    Resize { flavor_ref: &'a str },
    ConfirmResize,
    Suspend,
    Resume,
}

impl ServerAction<'_> {
    pub(super) const fn name(self) -> &'static str {
        match self {
            Self::Resize { .. } => "resize",
            Self::ConfirmResize => "confirmResize",
            Self::Suspend => "suspend",
            Self::Resume => "resume",
        }
    }

    pub(super) fn body(self) -> Value {
        match self {
            Self::Resize { flavor_ref } => json!({ "resize": { "flavorRef": flavor_ref } }),
            Self::ConfirmResize | Self::Suspend | Self::Resume => {
                let mut body = Map::new();
                body.insert(self.name().to_owned(), Value::Null);
                Value::Object(body)
            }
        }
    }
}
