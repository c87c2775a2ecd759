//! UseCase: 切断処理

use std::sync::Arc;

use crate::domain::{ConnectionId, Identity, MessagePusher, ServerEvent, SessionRepository};

use super::broadcast::BroadcastRouter;

pub struct DisconnectUseCase {
    sessions: Arc<dyn SessionRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    router: Arc<BroadcastRouter>,
}

impl DisconnectUseCase {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        router: Arc<BroadcastRouter>,
    ) -> Self {
        Self {
            sessions,
            message_pusher,
            router,
        }
    }

    /// 接続に紐づく状態を解放し、生徒だった場合は残りの参加者に `student_left` を配信する
    ///
    /// 処理中の分類はキャンセルしない。
    pub async fn execute(&self, connection_id: &ConnectionId) -> Option<Identity> {
        self.message_pusher.unregister_client(connection_id).await;
        let identity = self.sessions.disconnect(connection_id).await;

        match &identity {
            Some(identity) => {
                tracing::info!(
                    "Student '{}' left class '{}'",
                    identity.student_id,
                    identity.class_id
                );
                self.router
                    .to_room(
                        &identity.class_id,
                        ServerEvent::StudentLeft {
                            student_id: identity.student_id.clone(),
                            name: identity.name.clone(),
                        },
                    )
                    .await;
            }
            None => tracing::info!("Connection '{}' closed", connection_id),
        }

        identity
    }
}
