//! HTTP reporting API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::ClassId,
    infrastructure::dto::http::{ClassCheckDto, ClassSummaryDto, HealthDto, RosterDto},
    ui::state::AppState,
};

fn parse_class_id(class_id: String) -> Result<ClassId, StatusCode> {
    ClassId::new(class_id).map_err(|e| {
        tracing::warn!("Invalid classId in path: {}", e);
        StatusCode::BAD_REQUEST
    })
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    Json(HealthDto {
        success: true,
        ts: state.clock.now_millis(),
    })
}

/// Students currently joined to a class
pub async fn get_roster(
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<String>,
) -> Result<Json<RosterDto>, StatusCode> {
    let class_id = parse_class_id(class_id)?;
    let roster = state.get_roster_usecase.execute(&class_id).await;

    // Domain Model から DTO への変換
    Ok(Json(RosterDto {
        success: true,
        roster: roster.iter().map(Into::into).collect(),
    }))
}

/// Per-student emotion summary of a class (empty for unknown classes)
pub async fn get_class_summary(
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<String>,
) -> Result<Json<ClassSummaryDto>, StatusCode> {
    let class_id = parse_class_id(class_id)?;
    let summaries = state.get_class_summary_usecase.execute(&class_id).await;

    Ok(Json(ClassSummaryDto {
        success: true,
        summary: summaries
            .into_iter()
            .map(|summary| (summary.student_id.as_str().to_string(), summary.into()))
            .collect(),
    }))
}

/// Whether a teacher has opened the class
pub async fn check_class(
    State(state): State<Arc<AppState>>,
    Path(class_id): Path<String>,
) -> Result<Json<ClassCheckDto>, StatusCode> {
    let class_id = parse_class_id(class_id)?;
    let exists = state.check_class_usecase.execute(&class_id).await;

    Ok(Json(ClassCheckDto {
        success: true,
        exists,
        class_id: class_id.into_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionId, DisplayName, Identity, SessionRepository, StudentId},
        infrastructure::{
            classifier::HttpEmotionClassifier,
            emotion_log::DisabledEmotionLog,
            message_pusher::WebSocketMessagePusher,
            repository::{InMemoryAggregateRepository, InMemorySessionRepository},
        },
        usecase::PipelineConfig,
    };
    use classmood_shared::time::FixedClock;

    fn create_state(sessions: Arc<InMemorySessionRepository>) -> Arc<AppState> {
        Arc::new(AppState::new(
            sessions,
            Arc::new(InMemoryAggregateRepository::default()),
            Arc::new(WebSocketMessagePusher::default()),
            Arc::new(HttpEmotionClassifier::new(
                "http://127.0.0.1:9/analyze".to_string(),
            )),
            Arc::new(DisabledEmotionLog),
            Arc::new(FixedClock::new(1_700_000_000_000)),
            PipelineConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_health_check() {
        // テスト項目: ヘルスチェックが success と現在時刻を返す
        // given (前提条件):
        let state = create_state(Arc::new(InMemorySessionRepository::default()));

        // when (操作):
        let Json(health) = health_check(State(state)).await;

        // then (期待する結果):
        assert_eq!(
            health,
            HealthDto {
                success: true,
                ts: 1_700_000_000_000
            }
        );
    }

    #[tokio::test]
    async fn test_roster_and_check() {
        // テスト項目: 名簿と存在確認がセッションの状態を反映する
        // given (前提条件):
        let sessions = Arc::new(InMemorySessionRepository::default());
        let class_id = ClassId::new("math".to_string()).unwrap();
        let teacher = ConnectionId::new("teacher".to_string()).unwrap();
        let student = ConnectionId::new("alice-conn".to_string()).unwrap();
        sessions.teacher_join(&teacher, &class_id).await;
        sessions
            .student_join(
                &student,
                Identity::new(
                    StudentId::new("s1".to_string()).unwrap(),
                    DisplayName::new(Some("Alice".to_string())),
                    class_id.clone(),
                ),
            )
            .await
            .unwrap();
        let state = create_state(sessions);

        // when (操作):
        let Json(roster) = get_roster(State(state.clone()), Path("math".to_string()))
            .await
            .unwrap();
        let Json(check) = check_class(State(state.clone()), Path("math".to_string()))
            .await
            .unwrap();
        let Json(missing) = check_class(State(state.clone()), Path("art".to_string()))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(roster.roster.len(), 1);
        assert_eq!(roster.roster[0].student_id, "s1");
        assert_eq!(roster.roster[0].socket_id, "alice-conn");
        assert!(check.exists);
        assert!(!missing.exists);
        assert_eq!(missing.class_id, "art");
    }

    #[tokio::test]
    async fn test_summary_of_unknown_class_is_empty() {
        // テスト項目: 記録のないクラスのサマリは空
        // given (前提条件):
        let state = create_state(Arc::new(InMemorySessionRepository::default()));

        // when (操作):
        let Json(summary) = get_class_summary(State(state), Path("art".to_string()))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(summary.success);
        assert!(summary.summary.is_empty());
    }

    #[tokio::test]
    async fn test_blank_class_id_is_rejected() {
        // テスト項目: 空白だけの classId は 400
        // given (前提条件):
        let state = create_state(Arc::new(InMemorySessionRepository::default()));

        // when (操作):
        let result = get_roster(State(state), Path(" ".to_string())).await;

        // then (期待する結果):
        assert_eq!(result.err(), Some(StatusCode::BAD_REQUEST));
    }
}
