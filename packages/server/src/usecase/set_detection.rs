//! UseCase: 検出の開始・停止

use std::sync::Arc;

use crate::domain::{ClassId, ServerEvent, SessionRepository};

use super::{broadcast::BroadcastRouter, error::DetectionError};

pub struct SetDetectionUseCase {
    sessions: Arc<dyn SessionRepository>,
    router: Arc<BroadcastRouter>,
}

impl SetDetectionUseCase {
    pub fn new(sessions: Arc<dyn SessionRepository>, router: Arc<BroadcastRouter>) -> Self {
        Self { sessions, router }
    }

    pub async fn execute(
        &self,
        class_id: Option<String>,
        enabled: bool,
    ) -> Result<(), DetectionError> {
        let class_id = class_id
            .and_then(|id| ClassId::new(id).ok())
            .ok_or_else(|| DetectionError::Validation("missing classId".to_string()))?;

        self.sessions.set_detection(&class_id, enabled).await;
        tracing::info!(
            "Detection {} for class '{}'",
            if enabled { "started" } else { "stopped" },
            class_id
        );

        let event = if enabled {
            ServerEvent::DetectionStarted {
                class_id: class_id.clone(),
            }
        } else {
            ServerEvent::DetectionStopped {
                class_id: class_id.clone(),
            }
        };
        self.router.to_room(&class_id, event).await;
        Ok(())
    }
}
