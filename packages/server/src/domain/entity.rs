//! エンティティ定義

use serde::{Deserialize, Serialize};

use super::value_object::{
    ClassId, Confidence, ConnectionId, DisplayName, Emotion, Engagement, StudentId, Timestamp,
};

/// 接続に紐づく生徒の身元
///
/// 1 つの接続につき高々 1 つ。再 join した場合は後勝ち。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub student_id: StudentId,
    pub name: DisplayName,
    pub class_id: ClassId,
}

impl Identity {
    pub fn new(student_id: StudentId, name: DisplayName, class_id: ClassId) -> Self {
        Self {
            student_id,
            name,
            class_id,
        }
    }
}

/// 名簿の 1 行（クラスに紐づいている生徒と、その接続）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub student_id: StudentId,
    pub name: DisplayName,
    pub connection_id: ConnectionId,
}

/// 分類対象として受信した静止画フレーム
///
/// join 前にバッファされることがあるため、受信したままの未検証の値を保持する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotFrame {
    pub image: Option<String>,
    pub student_id: Option<String>,
    pub name: Option<String>,
    pub class_id: Option<String>,
}

/// 1 回の分類結果から作られる不変のイベント
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionEvent {
    pub emotion: Emotion,
    pub confidence: Confidence,
    pub engagement: Engagement,
    pub timestamp: Timestamp,
}
