//! WebSocket message DTOs.
//!
//! Every text frame is a JSON object tagged by `"type"`; payload fields are camelCase.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload of a pure relay event (`raise_hand`, `lower_hand`, `ask_doubt`).
///
/// Everything except `classId` is forwarded untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayPayload {
    #[serde(rename = "classId", default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Events sent by browsers
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum InboundMessage {
    TeacherJoin {
        class_id: Option<String>,
    },
    JoinClass {
        student_id: Option<String>,
        name: Option<String>,
        class_id: Option<String>,
    },
    StartDetection {
        class_id: Option<String>,
    },
    StopDetection {
        class_id: Option<String>,
    },
    CameraState {
        student_id: Option<String>,
        name: Option<String>,
        class_id: Option<String>,
        enabled: Option<Value>,
    },
    VideoStream {
        image: Option<String>,
    },
    Snapshot {
        image: Option<String>,
        student_id: Option<String>,
        name: Option<String>,
        class_id: Option<String>,
    },
    RaiseHand(RelayPayload),
    LowerHand(RelayPayload),
    AskDoubt(RelayPayload),
    TeacherVideo {
        class_id: Option<String>,
        image: Option<String>,
    },
    TeacherVideoStopped {
        class_id: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStatusDto {
    Ok,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatusDto {
    Ok,
    Queued,
    QueuedBeforeJoin,
    DetectionInactive,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterMemberDto {
    pub student_id: String,
    pub name: String,
    pub socket_id: String,
}

/// Events sent to browsers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OutboundMessage {
    TeacherJoinAck {
        status: AckStatusDto,
        #[serde(skip_serializing_if = "Option::is_none")]
        class_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        roster: Vec<RosterMemberDto>,
    },
    JoinAck {
        status: AckStatusDto,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        student_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        class_id: Option<String>,
    },
    StudentJoined {
        student_id: String,
        name: String,
        socket_id: String,
    },
    StudentLeft {
        student_id: String,
        name: String,
    },
    DetectionStarted {
        class_id: String,
    },
    DetectionStopped {
        class_id: String,
    },
    StudentCameraState {
        student_id: String,
        name: Option<String>,
        enabled: bool,
    },
    StudentVideoStream {
        student_id: String,
        name: String,
        image: String,
    },
    EmotionUpdate {
        student_id: String,
        name: String,
        emotion: String,
        confidence: f64,
        engagement: u8,
        /// RFC 3339
        timestamp: String,
        #[serde(rename = "box")]
        face_box: Option<Value>,
        source: String,
    },
    SnapshotAck {
        status: SnapshotStatusDto,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    RaiseHand(Map<String, Value>),
    LowerHand(Map<String, Value>),
    AskDoubt(Map<String, Value>),
    TeacherVideo {
        image: String,
    },
    TeacherVideoStopped {
        class_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_join_class() {
        // テスト項目: join_class が camelCase のフィールドで解釈される
        let msg: InboundMessage = serde_json::from_value(json!({
            "type": "join_class",
            "studentId": "s1",
            "name": "Aiko",
            "classId": "math"
        }))
        .unwrap();
        assert_eq!(
            msg,
            InboundMessage::JoinClass {
                student_id: Some("s1".to_string()),
                name: Some("Aiko".to_string()),
                class_id: Some("math".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_missing_fields_as_none() {
        // テスト項目: 欠けたフィールドはエラーではなく None になる
        let msg: InboundMessage =
            serde_json::from_value(json!({"type": "snapshot", "image": "data:..."})).unwrap();
        assert!(matches!(
            msg,
            InboundMessage::Snapshot {
                student_id: None,
                class_id: None,
                ..
            }
        ));
    }

    #[test]
    fn test_relay_payload_keeps_extra_fields() {
        // テスト項目: 中継イベントは classId 以外のフィールドを保持する
        let msg: InboundMessage = serde_json::from_value(json!({
            "type": "ask_doubt",
            "classId": "math",
            "studentId": "s1",
            "doubt": "What is a monad?"
        }))
        .unwrap();
        let InboundMessage::AskDoubt(payload) = msg else {
            panic!("expected ask_doubt");
        };
        assert_eq!(payload.class_id.as_deref(), Some("math"));
        assert_eq!(payload.rest["doubt"], "What is a monad?");
        assert!(!payload.rest.contains_key("type"));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        // テスト項目: 未知のイベント種別はパースエラーになる
        let result = serde_json::from_value::<InboundMessage>(json!({"type": "dance"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_snapshot_ack() {
        // テスト項目: snapshot_ack がステータスを snake_case で出力し、reason が無ければ省略する
        let json = serde_json::to_value(OutboundMessage::SnapshotAck {
            status: SnapshotStatusDto::QueuedBeforeJoin,
            reason: None,
        })
        .unwrap();
        assert_eq!(
            json,
            json!({"type": "snapshot_ack", "status": "queued_before_join"})
        );
    }
}
