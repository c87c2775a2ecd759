//! InMemory Session Repository 実装

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Admission, ClassId, ConnectionId, Identity, RepositoryError, RosterEntry, SessionRegistry,
    SessionRepository, SnapshotFrame, StudentJoined,
};

/// インメモリ Session Repository 実装
///
/// SessionRegistry ドメインモデルを保持し、ドメイン層の SessionRepository trait を実装します（依存性の逆転）。
pub struct InMemorySessionRepository {
    registry: Arc<Mutex<SessionRegistry>>,
}

impl InMemorySessionRepository {
    pub fn new(registry: Arc<Mutex<SessionRegistry>>) -> Self {
        Self { registry }
    }
}

impl Default for InMemorySessionRepository {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(SessionRegistry::default())))
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn teacher_join(
        &self,
        connection_id: &ConnectionId,
        class_id: &ClassId,
    ) -> Vec<RosterEntry> {
        let mut registry = self.registry.lock().await;
        registry.teacher_join(connection_id, class_id)
    }

    async fn student_join(
        &self,
        connection_id: &ConnectionId,
        identity: Identity,
    ) -> Result<StudentJoined, RepositoryError> {
        let mut registry = self.registry.lock().await;
        registry.student_join(connection_id, identity)
    }

    async fn disconnect(&self, connection_id: &ConnectionId) -> Option<Identity> {
        let mut registry = self.registry.lock().await;
        registry.disconnect(connection_id)
    }

    async fn set_detection(&self, class_id: &ClassId, enabled: bool) {
        let mut registry = self.registry.lock().await;
        registry.set_detection(class_id, enabled);
    }

    async fn admit_snapshot(
        &self,
        connection_id: &ConnectionId,
        frame: SnapshotFrame,
    ) -> Admission {
        let mut registry = self.registry.lock().await;
        registry.admit_snapshot(connection_id, frame)
    }

    async fn admit_replayed_snapshot(&self, connection_id: &ConnectionId) -> Admission {
        let registry = self.registry.lock().await;
        registry.admit_replayed_snapshot(connection_id)
    }

    async fn identity(&self, connection_id: &ConnectionId) -> Option<Identity> {
        let registry = self.registry.lock().await;
        registry.identity(connection_id).cloned()
    }

    async fn is_active(&self, class_id: &ClassId) -> bool {
        let registry = self.registry.lock().await;
        registry.is_active(class_id)
    }

    async fn room_members(&self, class_id: &ClassId) -> Vec<ConnectionId> {
        let registry = self.registry.lock().await;
        registry.room_members(class_id)
    }

    async fn roster(&self, class_id: &ClassId) -> Vec<RosterEntry> {
        let registry = self.registry.lock().await;
        registry.roster(class_id)
    }
}
