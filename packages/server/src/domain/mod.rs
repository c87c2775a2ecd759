//! ドメイン層
//!
//! 値オブジェクト・エンティティ・純粋な状態遷移と、
//! 外部との境界になる trait を定義します。

pub mod aggregation;
pub mod classifier;
pub mod emotion_log;
pub mod entity;
pub mod error;
pub mod event;
pub mod in_flight;
pub mod message_pusher;
pub mod normalizer;
pub mod repository;
pub mod scorer;
pub mod session;
pub mod value_object;

pub use aggregation::{AggregationStore, StudentAggregate, StudentSummary};
pub use classifier::{ClassificationRequest, EmotionClassifier, RawClassification};
pub use emotion_log::{EmotionLog, EmotionRecord};
pub use entity::{EmotionEvent, Identity, RosterEntry, SnapshotFrame};
pub use error::{
    ClassifierError, EmotionLogError, MessagePushError, RepositoryError, ValueObjectError,
};
pub use event::{AckStatus, EmotionUpdate, RelayKind, ServerEvent, SnapshotStatus};
pub use in_flight::{InFlightGuards, InFlightToken};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use repository::{AggregateRepository, SessionRepository};
pub use session::{Admission, ClassRoom, SessionRegistry, StudentJoined};
pub use value_object::{
    ClassId, Confidence, ConnectionId, DisplayName, Emotion, Engagement, StudentId, Timestamp,
};
