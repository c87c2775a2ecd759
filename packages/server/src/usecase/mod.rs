//! UseCase 層
//!
//! 受信イベントごとのユースケースと、レポート用の読み取り専用ユースケースを定義します。
//! 送信元への ack とルームへの配信は [`BroadcastRouter`] を通して行います。

pub mod broadcast;
pub mod check_class;
pub mod connect;
pub mod disconnect;
pub mod error;
pub mod get_class_summary;
pub mod get_roster;
pub mod relay;
pub mod set_detection;
pub mod student_join;
pub mod submit_snapshot;
pub mod teacher_join;

#[cfg(test)]
pub(crate) mod test_support;

pub use broadcast::BroadcastRouter;
pub use check_class::CheckClassUseCase;
pub use connect::ConnectUseCase;
pub use disconnect::DisconnectUseCase;
pub use error::{DetectionError, RelayError, SnapshotError, StudentJoinError, TeacherJoinError};
pub use get_class_summary::GetClassSummaryUseCase;
pub use get_roster::GetRosterUseCase;
pub use relay::RelayUseCase;
pub use set_detection::SetDetectionUseCase;
pub use student_join::StudentJoinUseCase;
pub use submit_snapshot::{
    AdmittedFrame, PipelineConfig, SnapshotOutcome, SnapshotPipeline, Submission,
};
pub use teacher_join::TeacherJoinUseCase;
