//! 接続へ通知するドメインイベント
//!
//! ワイヤ形式（JSON）への変換は Infrastructure 層の DTO が担当する。

use serde_json::{Map, Value};

use super::{
    entity::RosterEntry,
    value_object::{
        ClassId, Confidence, ConnectionId, DisplayName, Emotion, Engagement, StudentId, Timestamp,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    Ok,
    Error,
}

/// スナップショットに対する応答ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotStatus {
    Ok,
    /// 同じ生徒の分類が処理中のため破棄
    Queued,
    /// join 前のためバッファ
    QueuedBeforeJoin,
    DetectionInactive,
    Error,
}

/// 中継のみ行うイベントの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayKind {
    RaiseHand,
    LowerHand,
    AskDoubt,
}

/// 分類結果の通知内容
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionUpdate {
    pub student_id: StudentId,
    pub name: DisplayName,
    pub emotion: Emotion,
    pub confidence: Confidence,
    pub engagement: Engagement,
    pub timestamp: Timestamp,
    pub face_box: Option<Value>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    TeacherJoinAck {
        status: AckStatus,
        class_id: Option<ClassId>,
        reason: Option<String>,
        roster: Vec<RosterEntry>,
    },
    JoinAck {
        status: AckStatus,
        reason: Option<String>,
        message: Option<String>,
        identity: Option<(StudentId, DisplayName, ClassId)>,
    },
    StudentJoined {
        student_id: StudentId,
        name: DisplayName,
        connection_id: ConnectionId,
    },
    StudentLeft {
        student_id: StudentId,
        name: DisplayName,
    },
    DetectionStarted {
        class_id: ClassId,
    },
    DetectionStopped {
        class_id: ClassId,
    },
    StudentCameraState {
        student_id: String,
        name: Option<String>,
        enabled: bool,
    },
    StudentVideoStream {
        student_id: StudentId,
        name: DisplayName,
        image: String,
    },
    EmotionUpdate(EmotionUpdate),
    SnapshotAck {
        status: SnapshotStatus,
        reason: Option<String>,
    },
    /// 受け取ったペイロードをそのまま中継する
    Relay {
        kind: RelayKind,
        payload: Map<String, Value>,
    },
    TeacherVideo {
        image: String,
    },
    TeacherVideoStopped {
        class_id: ClassId,
    },
}

impl ServerEvent {
    pub fn snapshot_ack(status: SnapshotStatus) -> Self {
        Self::SnapshotAck {
            status,
            reason: None,
        }
    }

    pub fn snapshot_error(reason: impl Into<String>) -> Self {
        Self::SnapshotAck {
            status: SnapshotStatus::Error,
            reason: Some(reason.into()),
        }
    }

    /// ワイヤ上のイベント名
    pub fn name(&self) -> &'static str {
        match self {
            Self::TeacherJoinAck { .. } => "teacher_join_ack",
            Self::JoinAck { .. } => "join_ack",
            Self::StudentJoined { .. } => "student_joined",
            Self::StudentLeft { .. } => "student_left",
            Self::DetectionStarted { .. } => "detection_started",
            Self::DetectionStopped { .. } => "detection_stopped",
            Self::StudentCameraState { .. } => "student_camera_state",
            Self::StudentVideoStream { .. } => "student_video_stream",
            Self::EmotionUpdate(_) => "emotion_update",
            Self::SnapshotAck { .. } => "snapshot_ack",
            Self::Relay {
                kind: RelayKind::RaiseHand,
                ..
            } => "raise_hand",
            Self::Relay {
                kind: RelayKind::LowerHand,
                ..
            } => "lower_hand",
            Self::Relay {
                kind: RelayKind::AskDoubt,
                ..
            } => "ask_doubt",
            Self::TeacherVideo { .. } => "teacher_video",
            Self::TeacherVideoStopped { .. } => "teacher_video_stopped",
        }
    }
}
