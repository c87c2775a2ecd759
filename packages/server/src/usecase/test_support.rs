//! UseCase テスト用の共通部品

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{
    domain::{
        ClassId, ConnectionId, DisplayName, Identity, MessagePushError, MessagePusher,
        PusherChannel, ServerEvent, SessionRepository, StudentId,
    },
    infrastructure::repository::InMemorySessionRepository,
};

/// 送信されたイベントを記録する MessagePusher
#[derive(Default)]
pub struct RecordingPusher {
    /// (送信先, イベント)。broadcast は送信先ごとに展開して記録する
    sent: Mutex<Vec<(ConnectionId, ServerEvent)>>,
}

impl RecordingPusher {
    pub fn sent(&self) -> Vec<(ConnectionId, ServerEvent)> {
        self.sent.lock().unwrap().clone()
    }

    /// 指定した接続が受け取ったイベント
    pub fn received_by(&self, connection_id: &ConnectionId) -> Vec<ServerEvent> {
        self.sent()
            .into_iter()
            .filter(|(to, _)| to == connection_id)
            .map(|(_, event)| event)
            .collect()
    }

    /// 指定した接続が受け取ったイベント名
    pub fn names_for(&self, connection_id: &ConnectionId) -> Vec<&'static str> {
        self.received_by(connection_id)
            .iter()
            .map(ServerEvent::name)
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl MessagePusher for RecordingPusher {
    async fn register_client(&self, _connection_id: ConnectionId, _sender: PusherChannel) {}

    async fn unregister_client(&self, _connection_id: &ConnectionId) {}

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &ServerEvent,
    ) -> Result<(), MessagePushError> {
        self.sent
            .lock()
            .unwrap()
            .push((connection_id.clone(), event.clone()));
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        event: &ServerEvent,
    ) -> Result<(), MessagePushError> {
        let mut sent = self.sent.lock().unwrap();
        for target in targets {
            sent.push((target, event.clone()));
        }
        Ok(())
    }
}

pub fn conn(id: &str) -> ConnectionId {
    ConnectionId::new(id.to_string()).unwrap()
}

pub fn class(id: &str) -> ClassId {
    ClassId::new(id.to_string()).unwrap()
}

pub fn identity(student: &str, name: &str, class_id: &str) -> Identity {
    Identity::new(
        StudentId::new(student.to_string()).unwrap(),
        DisplayName::new(Some(name.to_string())),
        class(class_id),
    )
}

/// 教師 1 人と生徒 1 人が join 済みのセッション
pub async fn sessions_with_class(
    teacher: &ConnectionId,
    student: &ConnectionId,
    identity: Identity,
) -> Arc<InMemorySessionRepository> {
    let sessions = Arc::new(InMemorySessionRepository::default());
    sessions.teacher_join(teacher, &identity.class_id).await;
    sessions.student_join(student, identity).await.unwrap();
    sessions
}
