//! UseCase: クラスの感情サマリ取得

use std::sync::Arc;

use crate::domain::{AggregateRepository, ClassId, StudentSummary};

pub struct GetClassSummaryUseCase {
    aggregates: Arc<dyn AggregateRepository>,
}

impl GetClassSummaryUseCase {
    pub fn new(aggregates: Arc<dyn AggregateRepository>) -> Self {
        Self { aggregates }
    }

    pub async fn execute(&self, class_id: &ClassId) -> Vec<StudentSummary> {
        self.aggregates.summarize(class_id).await
    }
}
