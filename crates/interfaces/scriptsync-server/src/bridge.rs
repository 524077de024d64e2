//! Stateless HTTP adapter over the session operations.
//!
//! Same payload shapes and semantics as the socket events; every error is
//! rendered as a structured `{error}` acknowledgment with status 200, so
//! callers never see an unhandled fault.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use scriptsync_core::protocol::{PullRequest, PullResponse, PushRequest, RemoteFile};
use scriptsync_session::SessionRegistry;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct SuccessBody {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ContentBody {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Exactly one correlated acknowledgment per request.
pub enum Ack<T> {
    Ok(T),
    Err(String),
}

impl<T: Serialize> IntoResponse for Ack<T> {
    fn into_response(self) -> Response {
        match self {
            Ack::Ok(body) => Json(body).into_response(),
            Ack::Err(error) => Json(ErrorBody { error }).into_response(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFromClientBody {
    pub socket_id: String,
    #[serde(flatten)]
    pub push: PushRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFromServerBody {
    pub socket_id: String,
    #[serde(flatten)]
    pub pull: PullRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFileContentQuery {
    pub socket_id: String,
    pub script_name: String,
    pub relative_path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    pub socket_id: String,
}

pub fn router(registry: Arc<SessionRegistry>) -> Router {
    Router::new()
        .route("/getFileContent", get(get_file_content))
        .route("/syncScriptFromClient", post(sync_from_client))
        .route("/syncScriptFromServer", post(sync_from_server))
        .route("/session", delete(remove_session))
        .with_state(registry)
}

async fn sync_from_client(
    State(registry): State<Arc<SessionRegistry>>,
    body: Result<Json<SyncFromClientBody>, JsonRejection>,
) -> Ack<SuccessBody> {
    // Malformed payloads ack as {error} like every other failure.
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return Ack::Err(format!("invalid request: {rejection}")),
    };
    let session = registry.get_or_create(&body.socket_id).await;
    match session.push(body.push).await {
        Ok(()) => Ack::Ok(SuccessBody { success: true }),
        Err(e) => Ack::Err(e.to_string()),
    }
}

async fn sync_from_server(
    State(registry): State<Arc<SessionRegistry>>,
    body: Result<Json<SyncFromServerBody>, JsonRejection>,
) -> Ack<PullResponse> {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return Ack::Err(format!("invalid request: {rejection}")),
    };
    let session = registry.get_or_create(&body.socket_id).await;
    match session.pull(body.pull).await {
        Ok(files) => {
            let script_files: BTreeMap<String, RemoteFile> = files
                .into_iter()
                .map(|(path, entry)| {
                    (
                        path,
                        RemoteFile {
                            hash: entry.hash,
                            content: entry.content,
                        },
                    )
                })
                .collect();
            Ack::Ok(PullResponse { script_files })
        }
        Err(e) => Ack::Err(e.to_string()),
    }
}

async fn get_file_content(
    State(registry): State<Arc<SessionRegistry>>,
    query: Result<Query<GetFileContentQuery>, QueryRejection>,
) -> Ack<ContentBody> {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return Ack::Err(format!("invalid request: {rejection}")),
    };
    // Read-only: an unknown socket id is an error rather than an implicit
    // session create.
    let Some(session) = registry.get(&query.socket_id) else {
        return Ack::Err(format!("unknown session '{}'", query.socket_id));
    };
    match session
        .get_file_content(&query.script_name, &query.relative_path)
        .await
    {
        Ok(content) => Ack::Ok(ContentBody { content }),
        Err(e) => Ack::Err(e.to_string()),
    }
}

async fn remove_session(
    State(registry): State<Arc<SessionRegistry>>,
    query: Result<Query<SessionQuery>, QueryRejection>,
) -> Ack<SuccessBody> {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return Ack::Err(format!("invalid request: {rejection}")),
    };
    registry.remove(&query.socket_id).await;
    Ack::Ok(SuccessBody { success: true })
}
