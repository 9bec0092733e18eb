use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{models::ChatMessage, state::AppState};

const OUTBOUND_BUFFER: usize = 64;

#[derive(Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
enum ClientEvent {
    Subscribe {
        #[serde(rename = "applierEmail")]
        applier_email: String,
    },
    SendMessage(IncomingMessage),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomingMessage {
    text: String,
    job_applier_email: String,
    message_sender: String,
    sender: String,
}

pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// One task writes outbound frames, one forwarder task per subscribed topic
/// feeds it. No session survives the socket: a reconnecting client has to
/// resubscribe and fetch missed history over `GET /messages`.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);

    let writer: JoinHandle<()> = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if ws_tx.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    let mut subscriptions: Vec<JoinHandle<()>> = Vec::new();
    tracing::debug!("chat socket connected");

    while let Some(received) = ws_rx.next().await {
        match received {
            Ok(Message::Text(raw)) => match serde_json::from_str::<ClientEvent>(&raw) {
                Ok(ClientEvent::Subscribe { applier_email }) => {
                    let rx = state.chat.subscribe(&applier_email);
                    subscriptions.push(spawn_forwarder(rx, out_tx.clone()));
                    tracing::debug!(topic = %applier_email, "chat socket subscribed");
                }
                Ok(ClientEvent::SendMessage(incoming)) => {
                    relay_message(&state, incoming).await;
                }
                Err(err) => {
                    tracing::debug!(error = %err, "ignoring malformed chat frame");
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(error = %err, "chat socket error");
                break;
            }
        }
    }

    for handle in &subscriptions {
        handle.abort();
    }
    writer.abort();
    tracing::debug!("chat socket disconnected");
}

/// Persist first, then broadcast to whoever is subscribed right now. No ack
/// and no retry; a failed persist drops the frame.
async fn relay_message(state: &AppState, incoming: IncomingMessage) {
    let message = ChatMessage {
        id: Uuid::new_v4(),
        text: incoming.text,
        applier_email: incoming.job_applier_email,
        sender_email: incoming.message_sender,
        sender: incoming.sender,
        created_at: Utc::now().naive_utc(),
    };

    if let Err(err) = state.store.insert_message(message.clone()).await {
        tracing::error!(error = %err, "failed to persist chat message");
        return;
    }

    let delivered = state.chat.publish(&message);
    tracing::debug!(topic = %message.applier_email, delivered, "relayed chat message");
}

fn spawn_forwarder(
    mut rx: broadcast::Receiver<ChatMessage>,
    out_tx: mpsc::Sender<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(message) => {
                    let frame = json!({
                        "event": message.applier_email,
                        "data": message,
                    })
                    .to_string();
                    if out_tx.send(frame).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "chat subscriber lagging, dropping frames");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
