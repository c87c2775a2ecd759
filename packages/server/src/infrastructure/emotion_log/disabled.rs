use async_trait::async_trait;

use crate::domain::{EmotionLog, EmotionLogError, EmotionRecord};

/// 何も保存しない EmotionLog
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledEmotionLog;

#[async_trait]
impl EmotionLog for DisabledEmotionLog {
    async fn insert(&self, record: EmotionRecord) -> Result<(), EmotionLogError> {
        tracing::trace!(
            "Emotion log disabled, dropping record for '{}'",
            record.student_id
        );
        Ok(())
    }
}
