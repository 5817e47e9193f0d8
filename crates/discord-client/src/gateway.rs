//! Gateway connection exposed as a stream of dispatch events.

use crate::client::DiscordClient;
use crate::error::DiscordError;
use crate::types::*;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_stream::Stream;
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

const GATEWAY_VERSION: u8 = 10;

mod op {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const RECONNECT: u8 = 7;
    pub const INVALID_SESSION: u8 = 9;
    pub const HELLO: u8 = 10;
    pub const HEARTBEAT_ACK: u8 = 11;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Gateway session manager.
///
/// Each session identifies from scratch; when a session ends for any reason
/// the gateway waits `reconnect_delay` and connects again.
pub struct Gateway {
    client: DiscordClient,
    intents: u64,
    reconnect_delay: Duration,
}

struct Session {
    sink: SplitSink<WsStream, WsMessage>,
    source: SplitStream<WsStream>,
    heartbeat: Duration,
}

impl Session {
    async fn send(&mut self, payload: serde_json::Value) -> Result<(), DiscordError> {
        self.sink
            .send(WsMessage::Text(payload.to_string()))
            .await
            .map_err(DiscordError::from)
    }
}

enum Step {
    Heartbeat,
    Frame(Option<Result<WsMessage, tungstenite::Error>>),
}

impl Gateway {
    /// Create a new gateway manager.
    pub fn new(client: DiscordClient, intents: u64, reconnect_delay: Duration) -> Self {
        Self {
            client,
            intents,
            reconnect_delay,
        }
    }

    /// Log in and receive dispatch events as an async stream.
    pub fn stream(self) -> impl Stream<Item = GatewayEvent> {
        async_stream::stream! {
            loop {
                let mut session = match self.connect().await {
                    Ok(session) => session,
                    Err(e) => {
                        error!("Gateway connect failed: {}", e);
                        sleep(self.reconnect_delay).await;
                        continue;
                    }
                };

                let mut heartbeat =
                    interval_at(Instant::now() + session.heartbeat, session.heartbeat);
                heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
                let mut sequence: Option<u64> = None;

                loop {
                    let step = tokio::select! {
                        _ = heartbeat.tick() => Step::Heartbeat,
                        frame = session.source.next() => Step::Frame(frame),
                    };

                    let payload = match step {
                        Step::Heartbeat => {
                            if let Err(e) = session.send(heartbeat_payload(sequence)).await {
                                warn!("Failed to send heartbeat: {}", e);
                                break;
                            }
                            continue;
                        }
                        Step::Frame(Some(Ok(WsMessage::Text(text)))) => {
                            match serde_json::from_str::<GatewayPayload>(&text) {
                                Ok(payload) => payload,
                                Err(e) => {
                                    warn!("Undecodable gateway frame: {}", e);
                                    continue;
                                }
                            }
                        }
                        Step::Frame(Some(Ok(WsMessage::Close(frame)))) => {
                            warn!("Gateway closed: {:?}", frame);
                            break;
                        }
                        Step::Frame(Some(Ok(_))) => continue,
                        Step::Frame(Some(Err(e))) => {
                            error!("Gateway error: {}", e);
                            break;
                        }
                        Step::Frame(None) => {
                            warn!("Gateway stream ended");
                            break;
                        }
                    };

                    if payload.s.is_some() {
                        sequence = payload.s;
                    }

                    match payload.op {
                        op::DISPATCH => {
                            if let Some(event) = decode_dispatch(&payload) {
                                yield event;
                            }
                        }
                        op::HEARTBEAT => {
                            if let Err(e) = session.send(heartbeat_payload(sequence)).await {
                                warn!("Failed to send heartbeat: {}", e);
                                break;
                            }
                        }
                        op::RECONNECT | op::INVALID_SESSION => {
                            info!("Gateway asked for a new session (op {})", payload.op);
                            break;
                        }
                        op::HEARTBEAT_ACK => debug!("Heartbeat acknowledged"),
                        other => debug!("Ignoring gateway op {}", other),
                    }
                }

                sleep(self.reconnect_delay).await;
            }
        }
    }

    /// Open the websocket, wait for hello and identify.
    async fn connect(&self) -> Result<Session, DiscordError> {
        let url = self.client.gateway_url().await?;
        let (ws, _) =
            connect_async(format!("{}/?v={}&encoding=json", url, GATEWAY_VERSION)).await?;
        let (sink, mut source) = ws.split();

        let hello = loop {
            match source.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    let payload: GatewayPayload = serde_json::from_str(&text)?;
                    if payload.op == op::HELLO {
                        break payload;
                    }
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
                None => return Err(DiscordError::Gateway("closed before hello".into())),
            }
        };

        let interval_ms = heartbeat_interval(&hello)
            .ok_or_else(|| DiscordError::Gateway("hello without a usable heartbeat_interval".into()))?;

        let mut session = Session {
            sink,
            source,
            heartbeat: Duration::from_millis(interval_ms),
        };
        session
            .send(identify_payload(self.client.token(), self.intents))
            .await?;

        info!("Gateway connected, heartbeat every {}ms", interval_ms);
        Ok(session)
    }
}

/// Heartbeat period from HELLO. Zero is rejected since a timer cannot tick
/// at that rate.
fn heartbeat_interval(hello: &GatewayPayload) -> Option<u64> {
    hello
        .d
        .as_ref()?
        .get("heartbeat_interval")?
        .as_u64()
        .filter(|ms| *ms > 0)
}

fn heartbeat_payload(sequence: Option<u64>) -> serde_json::Value {
    json!({ "op": op::HEARTBEAT, "d": sequence })
}

fn identify_payload(token: &str, intents: u64) -> serde_json::Value {
    json!({
        "op": op::IDENTIFY,
        "d": {
            "token": token,
            "intents": intents,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "discord-client",
                "device": "discord-client"
            }
        }
    })
}

/// Decode a dispatch frame into one of the events the bot handles.
pub(crate) fn decode_dispatch(payload: &GatewayPayload) -> Option<GatewayEvent> {
    let name = payload.t.as_deref()?;
    let data = payload.d.clone()?;

    let decoded = match name {
        "READY" => serde_json::from_value(data).map(GatewayEvent::Ready),
        "INTERACTION_CREATE" => {
            serde_json::from_value(data).map(|i| GatewayEvent::InteractionCreate(Box::new(i)))
        }
        "MESSAGE_CREATE" => {
            serde_json::from_value(data).map(|m| GatewayEvent::MessageCreate(Box::new(m)))
        }
        _ => {
            debug!("Ignoring dispatch {}", name);
            return None;
        }
    };

    match decoded {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Failed to decode {} dispatch: {}", name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatch(name: &str, data: serde_json::Value) -> GatewayPayload {
        GatewayPayload {
            op: op::DISPATCH,
            d: Some(data),
            s: Some(3),
            t: Some(name.into()),
        }
    }

    #[test]
    fn test_decode_ready() {
        let payload = dispatch(
            "READY",
            json!({
                "v": 10,
                "session_id": "abc",
                "user": { "id": "42", "username": "springs", "discriminator": "0", "bot": true },
                "guilds": []
            }),
        );

        match decode_dispatch(&payload) {
            Some(GatewayEvent::Ready(ready)) => {
                assert_eq!(ready.session_id, "abc");
                assert_eq!(ready.user.tag(), "springs");
                assert!(ready.user.bot);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_decode_message_create() {
        let payload = dispatch(
            "MESSAGE_CREATE",
            json!({
                "id": "1",
                "channel_id": "10",
                "guild_id": "100",
                "author": { "id": "7", "username": "golfer" },
                "content": "anyone up for nine springs?",
                "timestamp": "2024-05-01T12:00:00.000000+00:00",
                "mentions": [],
                "member": { "roles": [] }
            }),
        );

        let event = decode_dispatch(&payload).unwrap();
        assert_eq!(event.kind(), EventKind::MessageCreate);
        if let GatewayEvent::MessageCreate(message) = event {
            assert_eq!(message.channel_id, "10");
            assert!(!message.author.bot);
        }
    }

    #[test]
    fn test_decode_unknown_dispatch() {
        let payload = dispatch("TYPING_START", json!({ "channel_id": "10" }));
        assert!(decode_dispatch(&payload).is_none());
    }

    #[test]
    fn test_decode_malformed_dispatch() {
        let payload = dispatch("INTERACTION_CREATE", json!({ "id": "1" }));
        assert!(decode_dispatch(&payload).is_none());
    }

    #[test]
    fn test_heartbeat_interval_from_hello() {
        let hello: GatewayPayload =
            serde_json::from_str(r#"{"op":10,"d":{"heartbeat_interval":41250},"s":null,"t":null}"#)
                .unwrap();
        assert_eq!(heartbeat_interval(&hello), Some(41250));
    }

    #[test]
    fn test_zero_or_missing_heartbeat_interval_is_rejected() {
        let zero: GatewayPayload =
            serde_json::from_str(r#"{"op":10,"d":{"heartbeat_interval":0}}"#).unwrap();
        assert_eq!(heartbeat_interval(&zero), None);

        let missing: GatewayPayload = serde_json::from_str(r#"{"op":10,"d":{}}"#).unwrap();
        assert_eq!(heartbeat_interval(&missing), None);
    }

    #[test]
    fn test_identify_payload() {
        let payload = identify_payload("secret", intents::DEFAULT);
        assert_eq!(payload["op"], 2);
        assert_eq!(payload["d"]["token"], "secret");
        assert_eq!(payload["d"]["intents"], intents::DEFAULT);
        assert_eq!(heartbeat_payload(None)["d"], serde_json::Value::Null);
        assert_eq!(heartbeat_payload(Some(5))["d"], 5);
    }
}
