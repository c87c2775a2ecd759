//! UseCase: 中継のみ行うイベント
//!
//! 挙手・質問・カメラ状態・映像など、状態を持たずにルームへ転送するイベントを扱う。

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::{ClassId, ConnectionId, RelayKind, ServerEvent, SessionRepository};

use super::{broadcast::BroadcastRouter, error::RelayError};

pub struct RelayUseCase {
    sessions: Arc<dyn SessionRepository>,
    router: Arc<BroadcastRouter>,
}

fn required_class(class_id: Option<String>) -> Result<ClassId, RelayError> {
    class_id
        .and_then(|id| ClassId::new(id).ok())
        .ok_or_else(|| RelayError::Validation("missing classId".to_string()))
}

impl RelayUseCase {
    pub fn new(sessions: Arc<dyn SessionRepository>, router: Arc<BroadcastRouter>) -> Self {
        Self { sessions, router }
    }

    /// `raise_hand` / `lower_hand` / `ask_doubt` をペイロードごとルームへ転送する
    pub async fn relay(
        &self,
        kind: RelayKind,
        payload: Map<String, Value>,
    ) -> Result<(), RelayError> {
        let class_id = required_class(
            payload
                .get("classId")
                .and_then(Value::as_str)
                .map(str::to_string),
        )?;
        let event = ServerEvent::Relay { kind, payload };
        tracing::info!("Relaying '{}' in class '{}'", event.name(), class_id);
        self.router.to_room(&class_id, event).await;
        Ok(())
    }

    /// カメラの ON/OFF。`enabled` が真偽値の `true` のときだけ ON とみなす
    pub async fn camera_state(
        &self,
        student_id: Option<String>,
        name: Option<String>,
        class_id: Option<String>,
        enabled: Option<&Value>,
    ) -> Result<(), RelayError> {
        let class_id = required_class(class_id)?;
        let student_id =
            student_id.ok_or_else(|| RelayError::Validation("missing studentId".to_string()))?;
        let enabled = matches!(enabled, Some(Value::Bool(true)));

        tracing::info!(
            "Camera of '{}' in class '{}' {}",
            student_id,
            class_id,
            if enabled { "enabled" } else { "disabled" }
        );
        self.router
            .to_room(
                &class_id,
                ServerEvent::StudentCameraState {
                    student_id,
                    name,
                    enabled,
                },
            )
            .await;
        Ok(())
    }

    /// 表示用の映像フレーム。join 済みの接続からのものだけ転送する
    pub async fn video_stream(
        &self,
        connection_id: &ConnectionId,
        image: Option<String>,
    ) -> Result<(), RelayError> {
        let identity = self
            .sessions
            .identity(connection_id)
            .await
            .ok_or(RelayError::NotJoined)?;
        let image = image
            .filter(|image| !image.is_empty())
            .ok_or_else(|| RelayError::Validation("missing image".to_string()))?;

        self.router
            .to_room(
                &identity.class_id,
                ServerEvent::StudentVideoStream {
                    student_id: identity.student_id,
                    name: identity.name,
                    image,
                },
            )
            .await;
        Ok(())
    }

    pub async fn teacher_video(
        &self,
        class_id: Option<String>,
        image: Option<String>,
    ) -> Result<(), RelayError> {
        let class_id = required_class(class_id)?;
        let image = image
            .filter(|image| !image.is_empty())
            .ok_or_else(|| RelayError::Validation("missing image".to_string()))?;
        self.router
            .to_room(&class_id, ServerEvent::TeacherVideo { image })
            .await;
        Ok(())
    }

    pub async fn teacher_video_stopped(&self, class_id: Option<String>) -> Result<(), RelayError> {
        let class_id = required_class(class_id)?;
        tracing::info!("Teacher video stopped in class '{}'", class_id);
        self.router
            .to_room(
                &class_id,
                ServerEvent::TeacherVideoStopped {
                    class_id: class_id.clone(),
                },
            )
            .await;
        Ok(())
    }
}
