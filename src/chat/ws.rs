/**
 * Chat WebSocket Engine
 *
 * One WebSocket connection per member. The connection is authenticated up
 * front (members only); afterwards the event loop handles room joins,
 * messages and leaves, and the drop of the socket runs the disconnect
 * cleanup deterministically.
 *
 * # Message Protocol
 *
 * **Client → Server:**
 * ```json
 * { "type": "joinRoom",    "bookId": "…" }
 * { "type": "sendMessage", "bookId": "…", "message": "…" }
 * { "type": "leaveRoom",   "bookId": "…" }
 * ```
 *
 * **Server → Client:**
 * ```json
 * { "type": "chatHistory", "bookId": "…", "messages": [ … ] }
 * { "type": "userJoined",  "bookId": "…", "memberId": "…", "name": "…" }
 * { "type": "newMessage",  "message": { … } }
 * { "type": "error",       "message": "…" }
 * ```
 *
 * Errors go to the originating connection only and never close it; the
 * single forced-close path is authentication failure.
 */
use std::collections::HashMap;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::chat::db::{book_exists, load_room_history, save_message, ChatMessageView};
use crate::error::{AppError, AppResult};
use crate::members::db::find_member_by_id;
use crate::members::Role;
use crate::middleware::auth::{authenticate_token, AuthenticatedUser};
use crate::server::state::AppState;

/// Events a client may send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    JoinRoom { book_id: Uuid },
    SendMessage { book_id: Uuid, message: String },
    LeaveRoom { book_id: Uuid },
}

/// Events fanned out through a room's broadcast channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RoomEvent {
    UserJoined {
        book_id: Uuid,
        member_id: Uuid,
        name: String,
    },
    NewMessage {
        message: ChatMessageView,
    },
}

/// Events sent to a single connection.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    ChatHistory {
        book_id: Uuid,
        messages: Vec<ChatMessageView>,
    },
    UserJoined {
        book_id: Uuid,
        member_id: Uuid,
        name: String,
    },
    NewMessage {
        message: ChatMessageView,
    },
    Error {
        message: String,
    },
}

impl From<RoomEvent> for ServerEvent {
    fn from(event: RoomEvent) -> Self {
        match event {
            RoomEvent::UserJoined {
                book_id,
                member_id,
                name,
            } => ServerEvent::UserJoined {
                book_id,
                member_id,
                name,
            },
            RoomEvent::NewMessage { message } => ServerEvent::NewMessage { message },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WsAuthParams {
    pub token: String,
}

/// GET /ws/chat?token=…
pub async fn chat_ws(
    ws: WebSocketUpgrade,
    Query(params): Query<WsAuthParams>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.token))
}

/// Per-connection state: the identity, the display name shown in room
/// events, and the forward task of every room this connection is
/// subscribed to.
struct Connection {
    user: AuthenticatedUser,
    display_name: String,
    forwards: HashMap<Uuid, JoinHandle<()>>,
}

async fn handle_socket(socket: WebSocket, state: AppState, token: String) {
    let (mut sender, mut receiver) = socket.split();

    // Authenticate before anything else. Only members may chat; the guard
    // failing is the one case where the server closes the socket itself.
    // The member row is resolved here too, so every room event this
    // connection produces carries the same display name the persisted
    // messages do.
    let resolved = match authenticate_token(&token) {
        Ok(user) if user.role == Role::Member => {
            match find_member_by_id(&state.pool, user.member_id).await {
                Ok(Some(member)) => Some((user, member.name)),
                _ => None,
            }
        }
        _ => None,
    };
    let Some((user, display_name)) = resolved else {
        tracing::warn!("WebSocket authentication failed");
        let event = ServerEvent::Error {
            message: "Authentication failed.".to_string(),
        };
        if let Ok(json) = serde_json::to_string(&event) {
            let _ = sender.send(Message::Text(json.into())).await;
        }
        let _ = sender.close().await;
        return;
    };

    tracing::info!(member_id = %user.member_id, "Chat connection established");

    // All outbound traffic for this connection funnels through one channel
    // so history replies and room broadcasts cannot interleave a frame.
    let (out_tx, mut out_rx) = mpsc::channel::<ServerEvent>(64);

    let mut write_task = tokio::spawn(async move {
        while let Some(event) = out_rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize chat event: {e:?}");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut conn = Connection {
        user,
        display_name,
        forwards: HashMap::new(),
    };

    loop {
        tokio::select! {
            message = receiver.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        let event = match serde_json::from_str::<ClientEvent>(&text) {
                            Ok(event) => event,
                            Err(e) => {
                                tracing::debug!("Unparseable chat event: {e:?}");
                                send_error(&out_tx, "Invalid event format.").await;
                                continue;
                            }
                        };
                        if let Err(e) = handle_event(&state, &mut conn, &out_tx, event).await {
                            send_error(&out_tx, &e.to_string()).await;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // ignore pings, pongs and binary frames
                    Some(Err(e)) => {
                        tracing::debug!("WebSocket receive error: {e:?}");
                        break;
                    }
                }
            }
            // The writer dying (client gone) ends the connection too.
            _ = &mut write_task => break,
        }
    }

    disconnect(&state, &mut conn);
    write_task.abort();
}

/// Dispatch one client event.
async fn handle_event(
    state: &AppState,
    conn: &mut Connection,
    out_tx: &mpsc::Sender<ServerEvent>,
    event: ClientEvent,
) -> AppResult<()> {
    match event {
        ClientEvent::JoinRoom { book_id } => join_room(state, conn, out_tx, book_id).await,
        ClientEvent::SendMessage { book_id, message } => {
            send_room_message(state, conn, book_id, &message).await
        }
        ClientEvent::LeaveRoom { book_id } => leave_room(state, conn, book_id),
    }
}

/// Join a book discussion room.
///
/// Validates the book, takes the presence slot (atomically — a duplicate
/// join fails here), subscribes the connection to the room channel, replays
/// history to this connection only and broadcasts the join notice.
async fn join_room(
    state: &AppState,
    conn: &mut Connection,
    out_tx: &mpsc::Sender<ServerEvent>,
    book_id: Uuid,
) -> AppResult<()> {
    if !book_exists(&state.pool, book_id).await? {
        return Err(AppError::BookNotFound);
    }

    state.presence.join(conn.user.member_id, book_id)?;

    // Subscribe before announcing so this connection observes everything
    // from its own join onwards.
    let mut room_rx = state.rooms.sender(book_id).subscribe();
    let forward_tx = out_tx.clone();
    let forward = tokio::spawn(async move {
        while let Ok(event) = room_rx.recv().await {
            if forward_tx.send(event.into()).await.is_err() {
                break;
            }
        }
    });
    if let Some(stale) = conn.forwards.insert(book_id, forward) {
        stale.abort();
    }

    let messages = load_room_history(&state.pool, book_id).await?;
    let _ = out_tx
        .send(ServerEvent::ChatHistory { book_id, messages })
        .await;

    tracing::info!(member_id = %conn.user.member_id, %book_id, "Member joined room");
    state.rooms.broadcast(
        book_id,
        RoomEvent::UserJoined {
            book_id,
            member_id: conn.user.member_id,
            name: conn.display_name.clone(),
        },
    );

    Ok(())
}

/// Persist a message and fan it out to the room.
async fn send_room_message(
    state: &AppState,
    conn: &Connection,
    book_id: Uuid,
    message: &str,
) -> AppResult<()> {
    if !book_exists(&state.pool, book_id).await? {
        return Err(AppError::BookNotFound);
    }

    if !state.presence.is_joined(conn.user.member_id, book_id) {
        return Err(AppError::NotInRoom);
    }

    let saved = save_message(&state.pool, conn.user.member_id, book_id, message).await?;
    state
        .rooms
        .broadcast(book_id, RoomEvent::NewMessage { message: saved });

    Ok(())
}

/// Explicitly leave a room: presence slot and room subscription both go.
fn leave_room(state: &AppState, conn: &mut Connection, book_id: Uuid) -> AppResult<()> {
    state.presence.leave(conn.user.member_id, book_id)?;
    if let Some(forward) = conn.forwards.remove(&book_id) {
        forward.abort();
    }
    Ok(())
}

/// Disconnect cleanup: release every room the member held.
fn disconnect(state: &AppState, conn: &mut Connection) {
    let released = state.presence.disconnect(conn.user.member_id);
    if !released.is_empty() {
        tracing::info!(
            member_id = %conn.user.member_id,
            rooms = released.len(),
            "Chat connection closed, memberships released"
        );
    }
    for (_, forward) in conn.forwards.drain() {
        forward.abort();
    }
}

async fn send_error(out_tx: &mpsc::Sender<ServerEvent>, message: &str) {
    let _ = out_tx
        .send(ServerEvent::Error {
            message: message.to_string(),
        })
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_client_event_wire_format() {
        let book_id = Uuid::new_v4();
        let json = format!(r#"{{"type":"joinRoom","bookId":"{book_id}"}}"#);
        let event: ClientEvent = serde_json::from_str(&json).unwrap();
        match event {
            ClientEvent::JoinRoom { book_id: parsed } => assert_eq!(parsed, book_id),
            other => panic!("Expected JoinRoom, got {other:?}"),
        }

        let json = format!(
            r#"{{"type":"sendMessage","bookId":"{book_id}","message":"hi"}}"#
        );
        let event: ClientEvent = serde_json::from_str(&json).unwrap();
        match event {
            ClientEvent::SendMessage { message, .. } => assert_eq!(message, "hi"),
            other => panic!("Expected SendMessage, got {other:?}"),
        }
    }

    #[test]
    fn test_server_event_tags() {
        let event = ServerEvent::Error {
            message: "Join the room before sending messages.".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "error");

        let event = ServerEvent::UserJoined {
            book_id: Uuid::new_v4(),
            member_id: Uuid::new_v4(),
            name: "reader".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "userJoined");
        assert!(json["bookId"].is_string());
        assert!(json["memberId"].is_string());
    }

    #[test]
    fn test_new_message_carries_sender_name() {
        let message = ChatMessageView {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            book_id: Uuid::new_v4(),
            sender_name: "Asma".into(),
            message: "loved the ending".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(ServerEvent::NewMessage { message }).unwrap();
        assert_eq!(json["type"], "newMessage");
        assert_eq!(json["message"]["senderName"], "Asma");
    }

    #[test]
    fn test_join_notice_and_messages_share_the_member_name() {
        // Both room events present the member by their stored display name,
        // never by email or any other identifier.
        let member_id = Uuid::new_v4();
        let book_id = Uuid::new_v4();

        let joined: ServerEvent = RoomEvent::UserJoined {
            book_id,
            member_id,
            name: "Asma".into(),
        }
        .into();
        let joined_json = serde_json::to_value(&joined).unwrap();
        assert_eq!(joined_json["name"], "Asma");

        let message = ChatMessageView {
            id: Uuid::new_v4(),
            user_id: member_id,
            book_id,
            sender_name: "Asma".into(),
            message: "hello".into(),
            created_at: Utc::now(),
        };
        let message_json = serde_json::to_value(ServerEvent::NewMessage { message }).unwrap();
        assert_eq!(message_json["message"]["senderName"], joined_json["name"]);
    }

    #[test]
    fn test_room_event_converts_to_server_event() {
        let book_id = Uuid::new_v4();
        let member_id = Uuid::new_v4();
        let event: ServerEvent = RoomEvent::UserJoined {
            book_id,
            member_id,
            name: "reader".into(),
        }
        .into();
        match event {
            ServerEvent::UserJoined {
                book_id: b,
                member_id: m,
                ..
            } => {
                assert_eq!(b, book_id);
                assert_eq!(m, member_id);
            }
            other => panic!("Expected UserJoined, got {other:?}"),
        }
    }
}
