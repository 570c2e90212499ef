//! Realtime change feed over the Phoenix channel websocket
//!
//! One socket per subscription: join `realtime:{topic}` with a
//! `postgres_changes` config, forward change payloads into the stream and
//! heartbeat every [`HEARTBEAT_INTERVAL_SECS`]. A subscription is only
//! returned once the server has accepted the join. The socket task stops
//! when the [`ChangeStream`] is dropped.

use super::{ChangeEvent, ChangeFilter, ChangeKind, ChangeStream};
use crate::error::{ClientError, ClientResult};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

/// Keepalive interval expected by the realtime server
pub const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// How long to wait for the join reply
pub const JOIN_TIMEOUT_SECS: u64 = 10;

const JOIN_REF: u64 = 1;

/// Phoenix channel frame
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

impl PhoenixMessage {
    /// Channel join carrying the change subscription
    pub fn join(filter: &ChangeFilter, access_token: &str, reference: u64) -> Self {
        let mut change = json!({
            "event": filter.event_name(),
            "schema": "public",
            "table": filter.table.as_str(),
        });
        if let Some(expr) = filter.filter_expr() {
            change["filter"] = Value::String(expr);
        }
        Self {
            topic: format!("realtime:{}", filter.topic()),
            event: "phx_join".into(),
            payload: json!({
                "config": { "postgres_changes": [change] },
                "access_token": access_token,
            }),
            reference: Some(reference.to_string()),
        }
    }

    pub fn heartbeat(reference: u64) -> Self {
        Self {
            topic: "phoenix".into(),
            event: "heartbeat".into(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }

    /// Row change carried by a `postgres_changes` frame
    pub fn change_event(&self) -> Option<ChangeEvent> {
        if self.event != "postgres_changes" {
            return None;
        }
        let data = self.payload.get("data")?;
        let kind = match data.get("type")?.as_str()? {
            "INSERT" => ChangeKind::Insert,
            "UPDATE" => ChangeKind::Update,
            "DELETE" => ChangeKind::Delete,
            _ => return None,
        };
        Some(ChangeEvent {
            kind,
            table: data.get("table")?.as_str()?.to_string(),
            record: data.get("record").cloned().unwrap_or_else(|| json!({})),
            old_record: data.get("old_record").cloned().unwrap_or_else(|| json!({})),
        })
    }

    /// Error text of a failed `phx_reply`
    pub fn reply_error(&self) -> Option<String> {
        if self.event != "phx_reply" {
            return None;
        }
        let status = self.payload.get("status")?.as_str()?;
        if status == "ok" {
            return None;
        }
        Some(
            self.payload
                .get("response")
                .map(|r| r.to_string())
                .unwrap_or_else(|| status.to_string()),
        )
    }
}

/// Open a socket, join the channel and return the change stream
pub async fn subscribe(
    url: url::Url,
    access_token: String,
    filter: ChangeFilter,
) -> ClientResult<ChangeStream> {
    let (ws, _response) = tokio_tungstenite::connect_async(url.as_str()).await?;
    let (mut sink, mut source) = ws.split();

    let join = PhoenixMessage::join(&filter, &access_token, JOIN_REF);
    sink.send(Message::Text(serde_json::to_string(&join)?))
        .await?;
    tracing::debug!(topic = %join.topic, "Realtime channel join sent");

    let (tx, rx) = mpsc::unbounded_channel();
    let joined = tokio::time::timeout(
        Duration::from_secs(JOIN_TIMEOUT_SECS),
        await_join(&mut source, &tx),
    )
    .await
    .map_err(|_| ClientError::Timeout("Realtime join".into()))?;
    if let Err(e) = joined {
        tracing::warn!(topic = %join.topic, error = %e, "Realtime join rejected");
        let _ = sink.send(Message::Close(None)).await;
        return Err(e);
    }
    tracing::debug!(topic = %join.topic, "Realtime channel joined");

    let shutdown = CancellationToken::new();
    let guard = shutdown.clone().drop_guard();
    let topic = join.topic.clone();

    tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));
        heartbeat.tick().await; // skip immediate tick
        let mut next_ref: u64 = 2;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
                _ = heartbeat.tick() => {
                    let beat = PhoenixMessage::heartbeat(next_ref);
                    next_ref += 1;
                    let Ok(text) = serde_json::to_string(&beat) else { continue };
                    if sink.send(Message::Text(text)).await.is_err() {
                        tracing::warn!(%topic, "Realtime heartbeat failed");
                        break;
                    }
                }
                frame = source.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            let Ok(msg) = serde_json::from_str::<PhoenixMessage>(&text) else {
                                tracing::debug!(%topic, "Ignoring unparseable realtime frame");
                                continue;
                            };
                            if let Some(err) = msg.reply_error() {
                                tracing::warn!(%topic, error = %err, "Realtime channel error");
                            } else if let Some(event) = msg.change_event() {
                                tracing::debug!(%topic, kind = event.kind.as_str(), "Realtime change");
                                if tx.send(event).is_err() {
                                    break;
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = sink.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::info!(%topic, "Realtime socket closed");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(%topic, error = %e, "Realtime socket error");
                            break;
                        }
                    }
                }
            }
        }
    });

    Ok(ChangeStream::new(rx, Some(guard)))
}

/// Read frames until the reply to the join arrives. Changes seen before it
/// are forwarded.
async fn await_join<S>(source: &mut S, tx: &mpsc::UnboundedSender<ChangeEvent>) -> ClientResult<()>
where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    let join_ref = JOIN_REF.to_string();
    while let Some(frame) = source.next().await {
        match frame? {
            Message::Text(text) => {
                let Ok(msg) = serde_json::from_str::<PhoenixMessage>(&text) else {
                    continue;
                };
                if msg.event == "phx_reply" && msg.reference.as_deref() == Some(join_ref.as_str()) {
                    return match join_error(&msg) {
                        Some(err) => Err(err),
                        None => Ok(()),
                    };
                }
                if let Some(event) = msg.change_event() {
                    let _ = tx.send(event);
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
    Err(ClientError::Realtime("socket closed before join reply".into()))
}

/// Map a join failure reply to a client error
pub fn join_error(reply: &PhoenixMessage) -> Option<ClientError> {
    reply.reply_error().map(ClientError::Realtime)
}
