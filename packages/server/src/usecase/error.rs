//! UseCase 層のエラー定義
//!
//! どのエラーもそのフレーム（イベント）限りで終わり、送信元への ack で報告される。

use thiserror::Error;

use crate::domain::{ClassifierError, SnapshotStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TeacherJoinError {
    #[error("invalid teacher_join: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StudentJoinError {
    #[error("invalid join_class: {0}")]
    Validation(String),

    /// 教師が join していないクラス
    #[error("class '{0}' not found")]
    ClassNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectionError {
    #[error("invalid detection toggle: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("invalid relay event: {0}")]
    Validation(String),

    /// 身元が紐づいていない接続からのイベント
    #[error("connection has not joined a class")]
    NotJoined,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("invalid snapshot: {0}")]
    Validation(String),

    #[error("detection is paused for this class")]
    DetectionInactive,

    /// 再処理の途中で接続が切断された
    #[error("connection has left the class")]
    NotJoined,

    /// 同じ生徒の分類が処理中
    #[error("classification already in flight for student '{0}'")]
    Busy(String),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

impl SnapshotError {
    /// 送信元に返す ack のステータス
    pub fn status(&self) -> SnapshotStatus {
        match self {
            Self::Validation(_) | Self::Classifier(_) | Self::NotJoined => SnapshotStatus::Error,
            Self::DetectionInactive => SnapshotStatus::DetectionInactive,
            Self::Busy(_) => SnapshotStatus::Queued,
        }
    }

    /// ack に添える理由（エラーステータスの場合のみ）
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Validation(reason) => Some(reason.clone()),
            Self::Classifier(e) => Some(e.to_string()),
            Self::DetectionInactive | Self::Busy(_) | Self::NotJoined => None,
        }
    }
}
