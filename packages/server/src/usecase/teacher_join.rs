//! UseCase: 教師の join
//!
//! クラスを有効化し、ack と現在の名簿を教師に返す。
//! 既に join 済みの生徒はそれぞれ `student_joined` として教師にだけ通知する。

use std::sync::Arc;

use crate::domain::{
    AckStatus, ClassId, ConnectionId, RosterEntry, ServerEvent, SessionRepository,
};

use super::{broadcast::BroadcastRouter, error::TeacherJoinError};

pub struct TeacherJoinUseCase {
    sessions: Arc<dyn SessionRepository>,
    router: Arc<BroadcastRouter>,
}

impl TeacherJoinUseCase {
    pub fn new(sessions: Arc<dyn SessionRepository>, router: Arc<BroadcastRouter>) -> Self {
        Self { sessions, router }
    }

    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        class_id: Option<String>,
    ) -> Result<Vec<RosterEntry>, TeacherJoinError> {
        let Some(class_id) = class_id.and_then(|id| ClassId::new(id).ok()) else {
            self.router
                .to_connection(
                    connection_id,
                    ServerEvent::TeacherJoinAck {
                        status: AckStatus::Error,
                        class_id: None,
                        reason: Some("missing fields".to_string()),
                        roster: Vec::new(),
                    },
                )
                .await;
            return Err(TeacherJoinError::Validation("missing classId".to_string()));
        };

        let roster = self.sessions.teacher_join(connection_id, &class_id).await;
        tracing::info!(
            "Teacher '{}' joined class '{}' ({} student(s) present)",
            connection_id,
            class_id,
            roster.len()
        );

        self.router
            .to_connection(
                connection_id,
                ServerEvent::TeacherJoinAck {
                    status: AckStatus::Ok,
                    class_id: Some(class_id),
                    reason: None,
                    roster: roster.clone(),
                },
            )
            .await;

        for entry in &roster {
            self.router
                .to_connection(
                    connection_id,
                    ServerEvent::StudentJoined {
                        student_id: entry.student_id.clone(),
                        name: entry.name.clone(),
                        connection_id: entry.connection_id.clone(),
                    },
                )
                .await;
        }

        Ok(roster)
    }
}
