//! UseCase: クラスの存在確認

use std::sync::Arc;

use crate::domain::{ClassId, SessionRepository};

pub struct CheckClassUseCase {
    sessions: Arc<dyn SessionRepository>,
}

impl CheckClassUseCase {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self { sessions }
    }

    /// 教師が一度でも join していれば `true`
    pub async fn execute(&self, class_id: &ClassId) -> bool {
        self.sessions.is_active(class_id).await
    }
}
