//! InMemory Aggregate Repository 実装

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    AggregateRepository, AggregationStore, ClassId, DisplayName, EmotionEvent, StudentId,
    StudentSummary,
};

/// インメモリ Aggregate Repository 実装
pub struct InMemoryAggregateRepository {
    store: Arc<Mutex<AggregationStore>>,
}

impl InMemoryAggregateRepository {
    pub fn new(store: Arc<Mutex<AggregationStore>>) -> Self {
        Self { store }
    }
}

impl Default for InMemoryAggregateRepository {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(AggregationStore::default())))
    }
}

#[async_trait]
impl AggregateRepository for InMemoryAggregateRepository {
    async fn record(
        &self,
        class_id: &ClassId,
        student_id: &StudentId,
        name: &DisplayName,
        event: EmotionEvent,
    ) {
        let mut store = self.store.lock().await;
        store.record(class_id, student_id, name, event);
    }

    async fn summarize(&self, class_id: &ClassId) -> Vec<StudentSummary> {
        let store = self.store.lock().await;
        store.summarize(class_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Confidence, Emotion, Engagement, Timestamp};

    #[tokio::test]
    async fn test_record_then_summarize() {
        // テスト項目: 記録したイベントがサマリに反映される
        // given (前提条件):
        let repo = InMemoryAggregateRepository::default();
        let class_id = ClassId::new("math".to_string()).unwrap();
        let student_id = StudentId::new("alice".to_string()).unwrap();
        let event = EmotionEvent {
            emotion: Emotion::Surprise,
            confidence: Confidence::new(0.6),
            engagement: Engagement::new(70),
            timestamp: Timestamp::new(42),
        };

        // when (操作):
        repo.record(&class_id, &student_id, &DisplayName::new(None), event)
            .await;
        let summary = repo.summarize(&class_id).await;

        // then (期待する結果):
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].total_samples, 1);
        assert_eq!(summary[0].dominant_emotion, Some(Emotion::Surprise));
        assert_eq!(summary[0].recent_events, vec![event]);
    }
}
