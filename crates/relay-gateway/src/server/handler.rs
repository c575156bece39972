//! Session endpoint
//!
//! Credentials are checked before the upgrade: a fresh connection needs a
//! valid access token; a reconnect needs a connection id and a reconnection
//! token. The reconnection token itself is redeemed after the upgrade, and a
//! refused reattach is reported with a close code. Only a fresh connection
//! may create a hub.

use super::{GatewayError, GatewayState};
use crate::connection::{ConnectionHandle, Session, WsConnection};
use crate::hub::HubDirectory;
use crate::peer::ReattachError;
use crate::protocol::DownstreamMessage;
use axum::{
    extract::{ws::WebSocket, Path, Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use relay_common::{ErrorResponse, RelayError};
use serde::Deserialize;
use std::sync::Arc;

/// Query parameters of `GET /client`
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    #[serde(rename = "hubId")]
    pub hub_id: Option<String>,
    pub access_token: Option<String>,
    #[serde(alias = "awps_connection_id")]
    pub connection_id: Option<String>,
    #[serde(alias = "awps_reconnection_token")]
    pub reconnection_token: Option<String>,
}

/// What the client presented
#[derive(Debug, PartialEq, Eq)]
enum Credential {
    Fresh {
        user_id: String,
    },
    Resume {
        connection_id: String,
        reconnection_token: String,
    },
}

/// `GET /client`
pub async fn client_handler(
    State(state): State<GatewayState>,
    Query(params): Query<ConnectParams>,
    ws: WebSocketUpgrade,
) -> Response {
    connect(&state, None, params, ws)
}

/// `GET /client/hubs/:hub_id`
pub async fn hub_client_handler(
    State(state): State<GatewayState>,
    Path(hub_id): Path<String>,
    Query(params): Query<ConnectParams>,
    ws: WebSocketUpgrade,
) -> Response {
    connect(&state, Some(hub_id), params, ws)
}

fn connect(
    state: &GatewayState,
    path_hub: Option<String>,
    params: ConnectParams,
    ws: WebSocketUpgrade,
) -> Response {
    let hub_id = resolve_hub_id(state, path_hub, &params);

    let credential = match authenticate(state, &params) {
        Ok(credential) => credential,
        Err(e) => {
            tracing::debug!(hub = %hub_id, error = %e, "Connection refused before upgrade");
            return reject(&e);
        }
    };

    let hubs = Arc::clone(state.hubs());
    ws.on_upgrade(move |socket| handle_socket(hubs, hub_id, credential, socket))
}

fn resolve_hub_id(state: &GatewayState, path_hub: Option<String>, params: &ConnectParams) -> String {
    path_hub
        .or_else(|| params.hub_id.clone())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| state.config().hub.default_hub.clone())
}

/// An access token wins over a reconnection credential.
fn authenticate(state: &GatewayState, params: &ConnectParams) -> Result<Credential, RelayError> {
    fn present(value: Option<&String>) -> Option<&str> {
        value.map(String::as_str).filter(|v| !v.is_empty())
    }

    if let Some(token) = present(params.access_token.as_ref()) {
        return state
            .identity()
            .user_id(token)
            .map(|user_id| Credential::Fresh { user_id })
            .ok_or(RelayError::InvalidAccessToken);
    }

    match (
        present(params.connection_id.as_ref()),
        present(params.reconnection_token.as_ref()),
    ) {
        (Some(connection_id), Some(reconnection_token)) => Ok(Credential::Resume {
            connection_id: connection_id.to_string(),
            reconnection_token: reconnection_token.to_string(),
        }),
        _ => Err(RelayError::MissingAuth),
    }
}

fn reject(err: &RelayError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::from(err))).into_response()
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(
    hubs: Arc<HubDirectory>,
    hub_id: String,
    credential: Credential,
    socket: WebSocket,
) {
    let connection = WsConnection::new(socket);

    let result = match credential {
        Credential::Fresh { user_id } => {
            let hub = hubs.get_or_create(&hub_id);
            Session::open(&hub, &user_id, connection.clone())
                .await
                .map(|_| ())
                .map_err(GatewayError::Open)
        }
        Credential::Resume {
            connection_id,
            reconnection_token,
        } => match hubs.get(&hub_id) {
            Some(hub) => {
                Session::resume(&hub, &connection_id, &reconnection_token, connection.clone())
                    .map(|_| ())
                    .map_err(GatewayError::from)
            }
            // A resumable peer only lives in a hub that already exists
            None => Err(GatewayError::Reattach(ReattachError::PeerNotFound)),
        },
    };

    if let Err(e) = result {
        tracing::debug!(hub = %hub_id, error = %e, "Closing transport");

        if matches!(e, GatewayError::Reattach(_)) {
            if let Ok(frame) = DownstreamMessage::disconnected(e.client_message()).to_frame() {
                let _ = connection.send(frame).await;
            }
        }
        connection.close(Some(e.to_close_code())).await;
    }
}
