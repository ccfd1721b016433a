//! Server events of the roundtable stream.
//!
//! Each SSE frame carries one JSON object discriminated by its `type` field.

use serde::{Deserialize, Deserializer, Serialize};

/// Kind of a transcript entry produced by an assistant turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Response,
    Opening,
    Summary,
    Closing,
}

/// A decoded roundtable stream event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    RoundStart {
        round: u32,
    },
    CoachStart {
        #[serde(deserialize_with = "string_or_number")]
        coach_id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        avatar: Option<String>,
    },
    ModeratorStart {
        #[serde(deserialize_with = "string_or_number")]
        coach_id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        avatar: Option<String>,
        #[serde(default)]
        message_type: MessageType,
    },
    Content {
        #[serde(deserialize_with = "string_or_number")]
        coach_id: String,
        content: String,
    },
    CoachEnd {
        #[serde(deserialize_with = "string_or_number")]
        coach_id: String,
    },
    ModeratorEnd {
        #[serde(deserialize_with = "string_or_number")]
        coach_id: String,
        #[serde(default)]
        message_type: Option<MessageType>,
    },
    RoundEnd {
        #[serde(default)]
        round: Option<u32>,
    },
    Done,
    Error {
        #[serde(default)]
        message: String,
    },
}

impl ServerEvent {
    /// Parses one frame payload. Returns `None` for malformed JSON or an
    /// unknown `type`.
    pub fn from_payload(payload: &str) -> Option<Self> {
        match serde_json::from_str(payload) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::debug!("[ServerEvent] Dropping unparseable frame: {}", e);
                None
            }
        }
    }

    /// True for events that end the exchange.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }
}

/// Backends differ on whether coach ids are numeric; both are accepted.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_each_event_kind() {
        let cases = [
            (r#"{"type":"round_start","round":2}"#, ServerEvent::RoundStart { round: 2 }),
            (
                r#"{"type":"coach_start","coach_id":"c1","name":"Ava","avatar":"a.png"}"#,
                ServerEvent::CoachStart {
                    coach_id: "c1".into(),
                    name: "Ava".into(),
                    avatar: Some("a.png".into()),
                },
            ),
            (
                r#"{"type":"moderator_start","coach_id":"m","name":"Mod","message_type":"opening"}"#,
                ServerEvent::ModeratorStart {
                    coach_id: "m".into(),
                    name: "Mod".into(),
                    avatar: None,
                    message_type: MessageType::Opening,
                },
            ),
            (
                r#"{"type":"content","coach_id":"c1","content":"Hi"}"#,
                ServerEvent::Content {
                    coach_id: "c1".into(),
                    content: "Hi".into(),
                },
            ),
            (
                r#"{"type":"coach_end","coach_id":"c1"}"#,
                ServerEvent::CoachEnd {
                    coach_id: "c1".into(),
                },
            ),
            (
                r#"{"type":"moderator_end","coach_id":"m","message_type":"summary"}"#,
                ServerEvent::ModeratorEnd {
                    coach_id: "m".into(),
                    message_type: Some(MessageType::Summary),
                },
            ),
            (r#"{"type":"round_end"}"#, ServerEvent::RoundEnd { round: None }),
            (r#"{"type":"done"}"#, ServerEvent::Done),
            (
                r#"{"type":"error","message":"boom"}"#,
                ServerEvent::Error {
                    message: "boom".into(),
                },
            ),
        ];

        for (payload, expected) in cases {
            assert_eq!(ServerEvent::from_payload(payload), Some(expected), "{payload}");
        }
    }

    #[test]
    fn test_numeric_coach_id_is_accepted() {
        let event = ServerEvent::from_payload(r#"{"type":"coach_end","coach_id":42}"#);
        assert_eq!(
            event,
            Some(ServerEvent::CoachEnd {
                coach_id: "42".into()
            })
        );
    }

    #[test]
    fn test_unknown_type_and_garbage_are_dropped() {
        assert_eq!(ServerEvent::from_payload(r#"{"type":"heartbeat"}"#), None);
        assert_eq!(ServerEvent::from_payload("{not json"), None);
        assert_eq!(ServerEvent::from_payload(r#"{"round":1}"#), None);
    }

    #[test]
    fn test_terminal_events() {
        assert!(ServerEvent::Done.is_terminal());
        assert!(
            ServerEvent::Error {
                message: String::new()
            }
            .is_terminal()
        );
        assert!(!ServerEvent::RoundEnd { round: None }.is_terminal());
    }
}
