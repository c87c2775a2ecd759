//! 感情ログ（ベストエフォートの永続化）の抽象化

use async_trait::async_trait;
use serde::Serialize;

use super::{
    error::EmotionLogError,
    value_object::{ClassId, Confidence, DisplayName, Emotion, Engagement, StudentId, Timestamp},
};

/// 永続化する 1 件のレコード
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionRecord {
    pub student_id: StudentId,
    pub name: DisplayName,
    pub class_id: ClassId,
    pub emotion: Emotion,
    pub confidence: Confidence,
    pub engagement: Engagement,
    pub timestamp: Timestamp,
}

/// 失敗は呼び出し側でログに残すだけで、再試行もしない
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmotionLog: Send + Sync {
    async fn insert(&self, record: EmotionRecord) -> Result<(), EmotionLogError>;
}
