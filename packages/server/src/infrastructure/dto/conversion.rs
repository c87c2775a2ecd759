//! Conversion logic between DTOs and domain entities.

use crate::domain::{
    AckStatus, EmotionEvent, RelayKind, RosterEntry, ServerEvent, SnapshotFrame, SnapshotStatus,
    StudentSummary,
};
use crate::infrastructure::dto::{
    http::{EmotionEventDto, StudentSummaryDto},
    websocket::{AckStatusDto, OutboundMessage, RelayPayload, RosterMemberDto, SnapshotStatusDto},
};
use classmood_shared::time::timestamp_to_rfc3339;
use serde_json::{Map, Value};

// ========================================
// DTO → Domain Entity
// ========================================

impl SnapshotFrame {
    pub fn from_parts(
        image: Option<String>,
        student_id: Option<String>,
        name: Option<String>,
        class_id: Option<String>,
    ) -> Self {
        Self {
            image: image.filter(|s| !s.is_empty()),
            student_id,
            name,
            class_id,
        }
    }
}

impl RelayPayload {
    /// 受信したままのペイロード（`classId` を含む）
    pub fn into_payload(self) -> Map<String, Value> {
        let mut payload = self.rest;
        if let Some(class_id) = self.class_id {
            payload.insert("classId".to_string(), Value::String(class_id));
        }
        payload
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<AckStatus> for AckStatusDto {
    fn from(status: AckStatus) -> Self {
        match status {
            AckStatus::Ok => Self::Ok,
            AckStatus::Error => Self::Error,
        }
    }
}

impl From<SnapshotStatus> for SnapshotStatusDto {
    fn from(status: SnapshotStatus) -> Self {
        match status {
            SnapshotStatus::Ok => Self::Ok,
            SnapshotStatus::Queued => Self::Queued,
            SnapshotStatus::QueuedBeforeJoin => Self::QueuedBeforeJoin,
            SnapshotStatus::DetectionInactive => Self::DetectionInactive,
            SnapshotStatus::Error => Self::Error,
        }
    }
}

impl From<&RosterEntry> for RosterMemberDto {
    fn from(entry: &RosterEntry) -> Self {
        Self {
            student_id: entry.student_id.as_str().to_string(),
            name: entry.name.as_str().to_string(),
            socket_id: entry.connection_id.as_str().to_string(),
        }
    }
}

impl From<&EmotionEvent> for EmotionEventDto {
    fn from(event: &EmotionEvent) -> Self {
        Self {
            emotion: event.emotion.as_str().to_string(),
            confidence: event.confidence.value(),
            engagement: event.engagement.value(),
            timestamp: timestamp_to_rfc3339(event.timestamp.value()),
        }
    }
}

impl From<StudentSummary> for StudentSummaryDto {
    fn from(summary: StudentSummary) -> Self {
        Self {
            student_id: summary.student_id.into_string(),
            name: summary.name.as_str().to_string(),
            total_samples: summary.total_samples,
            avg_engagement: summary.average_engagement,
            dominant_emotion: summary.dominant_emotion.map(|e| e.as_str().to_string()),
            counts: summary
                .counts
                .iter()
                .map(|(emotion, count)| (emotion.as_str().to_string(), *count))
                .collect(),
            last_seen: summary.last_seen.map(|t| timestamp_to_rfc3339(t.value())),
            events_sample: summary.recent_events.iter().map(Into::into).collect(),
        }
    }
}

impl From<&ServerEvent> for OutboundMessage {
    fn from(event: &ServerEvent) -> Self {
        match event {
            ServerEvent::TeacherJoinAck {
                status,
                class_id,
                reason,
                roster,
            } => Self::TeacherJoinAck {
                status: (*status).into(),
                class_id: class_id.as_ref().map(|c| c.as_str().to_string()),
                reason: reason.clone(),
                roster: roster.iter().map(Into::into).collect(),
            },
            ServerEvent::JoinAck {
                status,
                reason,
                message,
                identity,
            } => Self::JoinAck {
                status: (*status).into(),
                reason: reason.clone(),
                message: message.clone(),
                student_id: identity.as_ref().map(|(s, _, _)| s.as_str().to_string()),
                name: identity.as_ref().map(|(_, n, _)| n.as_str().to_string()),
                class_id: identity.as_ref().map(|(_, _, c)| c.as_str().to_string()),
            },
            ServerEvent::StudentJoined {
                student_id,
                name,
                connection_id,
            } => Self::StudentJoined {
                student_id: student_id.as_str().to_string(),
                name: name.as_str().to_string(),
                socket_id: connection_id.as_str().to_string(),
            },
            ServerEvent::StudentLeft { student_id, name } => Self::StudentLeft {
                student_id: student_id.as_str().to_string(),
                name: name.as_str().to_string(),
            },
            ServerEvent::DetectionStarted { class_id } => Self::DetectionStarted {
                class_id: class_id.as_str().to_string(),
            },
            ServerEvent::DetectionStopped { class_id } => Self::DetectionStopped {
                class_id: class_id.as_str().to_string(),
            },
            ServerEvent::StudentCameraState {
                student_id,
                name,
                enabled,
            } => Self::StudentCameraState {
                student_id: student_id.clone(),
                name: name.clone(),
                enabled: *enabled,
            },
            ServerEvent::StudentVideoStream {
                student_id,
                name,
                image,
            } => Self::StudentVideoStream {
                student_id: student_id.as_str().to_string(),
                name: name.as_str().to_string(),
                image: image.clone(),
            },
            ServerEvent::EmotionUpdate(update) => Self::EmotionUpdate {
                student_id: update.student_id.as_str().to_string(),
                name: update.name.as_str().to_string(),
                emotion: update.emotion.as_str().to_string(),
                confidence: update.confidence.value(),
                engagement: update.engagement.value(),
                timestamp: timestamp_to_rfc3339(update.timestamp.value()),
                face_box: update.face_box.clone(),
                source: update.source.clone(),
            },
            ServerEvent::SnapshotAck { status, reason } => Self::SnapshotAck {
                status: (*status).into(),
                reason: reason.clone(),
            },
            ServerEvent::Relay { kind, payload } => match kind {
                RelayKind::RaiseHand => Self::RaiseHand(payload.clone()),
                RelayKind::LowerHand => Self::LowerHand(payload.clone()),
                RelayKind::AskDoubt => Self::AskDoubt(payload.clone()),
            },
            ServerEvent::TeacherVideo { image } => Self::TeacherVideo {
                image: image.clone(),
            },
            ServerEvent::TeacherVideoStopped { class_id } => Self::TeacherVideoStopped {
                class_id: class_id.as_str().to_string(),
            },
        }
    }
}

/// ドメインイベントを 1 フレーム分の JSON に変換する
pub fn encode_event(event: &ServerEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(&OutboundMessage::from(event))
}
