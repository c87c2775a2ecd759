//! Shared application state.

use std::sync::Arc;

use classmood_shared::time::Clock;

use crate::{
    domain::{
        AggregateRepository, EmotionClassifier, EmotionLog, MessagePusher, SessionRepository,
    },
    usecase::{
        BroadcastRouter, CheckClassUseCase, ConnectUseCase, DisconnectUseCase,
        GetClassSummaryUseCase, GetRosterUseCase, PipelineConfig, RelayUseCase,
        SetDetectionUseCase, SnapshotPipeline, StudentJoinUseCase, TeacherJoinUseCase,
    },
};

/// Shared application state
pub struct AppState {
    pub connect_usecase: Arc<ConnectUseCase>,
    pub disconnect_usecase: Arc<DisconnectUseCase>,
    pub teacher_join_usecase: Arc<TeacherJoinUseCase>,
    pub student_join_usecase: Arc<StudentJoinUseCase>,
    pub set_detection_usecase: Arc<SetDetectionUseCase>,
    pub relay_usecase: Arc<RelayUseCase>,
    /// Snapshot Pipeline（感情分類のユースケース）
    pub snapshot_pipeline: Arc<SnapshotPipeline>,
    pub get_roster_usecase: Arc<GetRosterUseCase>,
    pub get_class_summary_usecase: Arc<GetClassSummaryUseCase>,
    pub check_class_usecase: Arc<CheckClassUseCase>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Repository と外部サービスからユースケースを組み立てる
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        aggregates: Arc<dyn AggregateRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        classifier: Arc<dyn EmotionClassifier>,
        emotion_log: Arc<dyn EmotionLog>,
        clock: Arc<dyn Clock>,
        config: PipelineConfig,
    ) -> Self {
        let router = Arc::new(BroadcastRouter::new(
            sessions.clone(),
            message_pusher.clone(),
        ));

        Self {
            connect_usecase: Arc::new(ConnectUseCase::new(message_pusher.clone())),
            disconnect_usecase: Arc::new(DisconnectUseCase::new(
                sessions.clone(),
                message_pusher,
                router.clone(),
            )),
            teacher_join_usecase: Arc::new(TeacherJoinUseCase::new(
                sessions.clone(),
                router.clone(),
            )),
            student_join_usecase: Arc::new(StudentJoinUseCase::new(
                sessions.clone(),
                router.clone(),
            )),
            set_detection_usecase: Arc::new(SetDetectionUseCase::new(
                sessions.clone(),
                router.clone(),
            )),
            relay_usecase: Arc::new(RelayUseCase::new(sessions.clone(), router.clone())),
            snapshot_pipeline: Arc::new(SnapshotPipeline::new(
                sessions.clone(),
                aggregates.clone(),
                classifier,
                emotion_log,
                router,
                clock.clone(),
                config,
            )),
            get_roster_usecase: Arc::new(GetRosterUseCase::new(sessions.clone())),
            get_class_summary_usecase: Arc::new(GetClassSummaryUseCase::new(aggregates)),
            check_class_usecase: Arc::new(CheckClassUseCase::new(sessions)),
            clock,
        }
    }
}
