//! UseCase: クラスの名簿取得

use std::sync::Arc;

use crate::domain::{ClassId, RosterEntry, SessionRepository};

pub struct GetRosterUseCase {
    sessions: Arc<dyn SessionRepository>,
}

impl GetRosterUseCase {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self { sessions }
    }

    /// 生徒 ID 順の名簿。未知のクラスなら空
    pub async fn execute(&self, class_id: &ClassId) -> Vec<RosterEntry> {
        self.sessions.roster(class_id).await
    }
}
