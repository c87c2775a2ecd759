//! Broadcast Router
//!
//! ルーム（クラス）に参加している全接続へイベントを配信する。
//! 配信は fire-and-forget で、届かなかった接続は呼び出し側に報告しない。
//! 配信先はブロードキャスト時点のルーム参加者のスナップショット。

use std::sync::Arc;

use crate::domain::{ClassId, ConnectionId, MessagePusher, ServerEvent, SessionRepository};

pub struct BroadcastRouter {
    sessions: Arc<dyn SessionRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl BroadcastRouter {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            sessions,
            message_pusher,
        }
    }

    /// ルームの全参加者（送信元を含む）に配信
    pub async fn to_room(&self, class_id: &ClassId, event: ServerEvent) {
        let members = self.sessions.room_members(class_id).await;
        tracing::debug!(
            "Broadcasting '{}' to {} connection(s) in '{}'",
            event.name(),
            members.len(),
            class_id
        );
        if let Err(e) = self.message_pusher.broadcast(members, &event).await {
            tracing::warn!("Failed to broadcast '{}' to '{}': {}", event.name(), class_id, e);
        }
    }

    /// 特定の接続に送信
    pub async fn to_connection(&self, connection_id: &ConnectionId, event: ServerEvent) {
        if let Err(e) = self.message_pusher.push_to(connection_id, &event).await {
            tracing::warn!(
                "Failed to push '{}' to connection '{}': {}",
                event.name(),
                connection_id,
                e
            );
        }
    }
}
