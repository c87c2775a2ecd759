//! UseCase: 生徒の join
//!
//! 有効なクラスにだけ join できる。成功するとルームに `student_joined` を配信し、
//! join 前にバッファされていたフレームを呼び出し側に返す（再投入は呼び出し側の責務）。

use std::sync::Arc;

use crate::domain::{
    AckStatus, ClassId, ConnectionId, DisplayName, Identity, RepositoryError, ServerEvent,
    SessionRepository, StudentId, StudentJoined,
};

use super::{broadcast::BroadcastRouter, error::StudentJoinError};

const CLASS_NOT_FOUND_MESSAGE: &str =
    "No class exists with this Class ID. Please check the Class ID and try again.";

pub struct StudentJoinUseCase {
    sessions: Arc<dyn SessionRepository>,
    router: Arc<BroadcastRouter>,
}

impl StudentJoinUseCase {
    pub fn new(sessions: Arc<dyn SessionRepository>, router: Arc<BroadcastRouter>) -> Self {
        Self { sessions, router }
    }

    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        student_id: Option<String>,
        name: Option<String>,
        class_id: Option<String>,
    ) -> Result<StudentJoined, StudentJoinError> {
        let student_id = student_id.and_then(|id| StudentId::new(id).ok());
        let class_id = class_id.and_then(|id| ClassId::new(id).ok());
        let (Some(student_id), Some(class_id)) = (student_id, class_id) else {
            self.reject(connection_id, "missing fields", None).await;
            return Err(StudentJoinError::Validation(
                "studentId and classId are required".to_string(),
            ));
        };

        let identity = Identity::new(student_id, DisplayName::new(name), class_id);
        let joined = match self.sessions.student_join(connection_id, identity).await {
            Ok(joined) => joined,
            Err(RepositoryError::ClassNotActive(class_id)) => {
                tracing::warn!(
                    "Rejected join from '{}': class '{}' is not active",
                    connection_id,
                    class_id
                );
                self.reject(
                    connection_id,
                    "class_not_found",
                    Some(CLASS_NOT_FOUND_MESSAGE.to_string()),
                )
                .await;
                return Err(StudentJoinError::ClassNotFound(class_id));
            }
        };

        let Identity {
            student_id,
            name,
            class_id,
        } = joined.identity.clone();
        tracing::info!(
            "Student '{}' ({}) joined class '{}'",
            student_id,
            name,
            class_id
        );

        self.router
            .to_room(
                &class_id,
                ServerEvent::StudentJoined {
                    student_id: student_id.clone(),
                    name: name.clone(),
                    connection_id: connection_id.clone(),
                },
            )
            .await;
        self.router
            .to_connection(
                connection_id,
                ServerEvent::JoinAck {
                    status: AckStatus::Ok,
                    reason: None,
                    message: None,
                    identity: Some((student_id, name, class_id)),
                },
            )
            .await;

        Ok(joined)
    }

    async fn reject(&self, connection_id: &ConnectionId, reason: &str, message: Option<String>) {
        self.router
            .to_connection(
                connection_id,
                ServerEvent::JoinAck {
                    status: AckStatus::Error,
                    reason: Some(reason.to_string()),
                    message,
                    identity: None,
                },
            )
            .await;
    }
}
