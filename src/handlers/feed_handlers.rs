//! Change feed over WebSocket.
//!
//! Subscribers receive small JSON events such as
//! `{"type":"allocations.changed"}` and re-fetch whatever they display.
//! Delivery is best effort: a closed connection is dropped on the next send.

use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::Message;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

use crate::auth::session::SessionContext;

pub const ALLOCATIONS_CHANGED: &str = "allocations.changed";
pub const RECORDS_CHANGED: &str = "records.changed";

/// Open feed connections per user.
pub type FeedHub = Arc<RwLock<HashMap<i64, Vec<mpsc::UnboundedSender<String>>>>>;

pub fn new_feed_hub() -> FeedHub {
    Arc::new(RwLock::new(HashMap::new()))
}

/// Send `event` to every open connection.
pub fn broadcast(hub: &FeedHub, event: &str) {
    let msg = serde_json::json!({ "type": event }).to_string();
    let mut map = hub.write().unwrap_or_else(|e| e.into_inner());
    for senders in map.values_mut() {
        senders.retain(|s| s.send(msg.clone()).is_ok());
    }
    map.retain(|_, senders| !senders.is_empty());
}

/// Number of users with at least one open connection.
pub fn subscriber_count(hub: &FeedHub) -> usize {
    hub.read().unwrap_or_else(|e| e.into_inner()).len()
}

pub fn subscribe(hub: &FeedHub, user_id: i64) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let mut map = hub.write().unwrap_or_else(|e| e.into_inner());
    map.entry(user_id).or_default().push(tx);
    rx
}

/// GET /ws/feed: WebSocket upgrade.
pub async fn ws_connect(
    req: HttpRequest,
    body: web::Payload,
    session: Session,
    hub: web::Data<FeedHub>,
) -> Result<HttpResponse, actix_web::Error> {
    let Some(ctx) = SessionContext::from_session(&session) else {
        return Ok(HttpResponse::Unauthorized().finish());
    };
    let user_id = ctx.user_id;

    let (response, mut ws_session, mut msg_stream) = actix_ws::handle(&req, body)?;
    let mut rx = subscribe(&hub, user_id);
    let hub = hub.into_inner();

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                Some(msg) = rx.recv() => {
                    if ws_session.text(msg).await.is_err() {
                        break;
                    }
                }
                Some(Ok(msg)) = msg_stream.recv() => {
                    match msg {
                        Message::Ping(bytes) => {
                            if ws_session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        // Clients act through the HTTP API, not the feed.
                        _ => {}
                    }
                }
                else => break,
            }
        }

        rx.close();
        let mut map = hub.write().unwrap_or_else(|e| e.into_inner());
        if let Some(senders) = map.get_mut(&user_id) {
            senders.retain(|s| !s.is_closed());
            if senders.is_empty() {
                map.remove(&user_id);
            }
        }
        log::debug!("Feed connection for user {user_id} closed");
    });

    Ok(response)
}
