//! UseCase: スナップショットの分類（Snapshot Pipeline）
//!
//! 1 フレームごとの状態遷移:
//!
//! ```text
//! Received ─┬─> PreJoinQueued                      (身元が未登録)
//!           ├─> Rejected(DetectionInactive|Busy|Validation)
//!           └─> Admitted ─> InFlight ─> Completed(Success|Failure)
//! ```
//!
//! 受付判定 ([`SnapshotPipeline::admit`]) は呼び出し元のタスクで同期的に行い、
//! 外部分類サービスの呼び出し ([`SnapshotPipeline::process`]) だけを別タスクで待てるように分けている。
//! どの経路でも送信元には `snapshot_ack` がちょうど 1 回返る。

use std::{sync::Arc, time::Duration};

use classmood_shared::time::Clock;

use crate::domain::{
    Admission, AggregateRepository, ClassId, ClassificationRequest, ClassifierError, ConnectionId,
    DisplayName, EmotionClassifier, EmotionEvent, EmotionLog, EmotionRecord, EmotionUpdate,
    Identity, InFlightGuards, InFlightToken, RawClassification, ServerEvent, SessionRepository,
    SnapshotFrame, SnapshotStatus, StudentId, Timestamp,
    aggregation::{DEFAULT_HISTORY_CAPACITY, DEFAULT_SUMMARY_SAMPLE},
    normalizer::normalize,
    scorer::score,
    session::DEFAULT_PENDING_CAPACITY,
};

use super::{broadcast::BroadcastRouter, error::SnapshotError};

/// 分類結果に `source` が無い場合の値
pub const DEFAULT_SOURCE: &str = "py-model";

/// パイプラインと関連するストアの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// 外部分類サービス呼び出しの上限時間
    pub classifier_timeout: Duration,
    /// join 前にバッファするフレーム数（接続ごと）
    pub pending_capacity: usize,
    /// 生徒ごとに保持する履歴の件数
    pub history_capacity: usize,
    /// サマリに含める直近の履歴件数
    pub summary_sample: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            classifier_timeout: Duration::from_secs(15),
            pending_capacity: DEFAULT_PENDING_CAPACITY,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            summary_sample: DEFAULT_SUMMARY_SAMPLE,
        }
    }
}

/// 受付済みのフレーム。処理中マーカーを保持している
#[derive(Debug)]
pub struct AdmittedFrame {
    connection_id: ConnectionId,
    identity: Identity,
    image: String,
    token: InFlightToken,
}

impl AdmittedFrame {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

/// 受付判定の結果
#[derive(Debug)]
pub enum Submission {
    /// join 前のためバッファした
    Buffered,
    Admitted(AdmittedFrame),
}

/// 1 フレームを最後まで処理した結果
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotOutcome {
    Buffered,
    Classified(EmotionUpdate),
}

pub struct SnapshotPipeline {
    sessions: Arc<dyn SessionRepository>,
    aggregates: Arc<dyn AggregateRepository>,
    classifier: Arc<dyn EmotionClassifier>,
    emotion_log: Arc<dyn EmotionLog>,
    router: Arc<BroadcastRouter>,
    clock: Arc<dyn Clock>,
    guards: InFlightGuards,
    config: PipelineConfig,
}

impl SnapshotPipeline {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        aggregates: Arc<dyn AggregateRepository>,
        classifier: Arc<dyn EmotionClassifier>,
        emotion_log: Arc<dyn EmotionLog>,
        router: Arc<BroadcastRouter>,
        clock: Arc<dyn Clock>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            sessions,
            aggregates,
            classifier,
            emotion_log,
            router,
            clock,
            guards: InFlightGuards::new(),
            config,
        }
    }

    pub fn guards(&self) -> &InFlightGuards {
        &self.guards
    }

    /// 受付判定
    ///
    /// 受け付けなかった場合はここで ack を返す。受け付けた場合は処理中マーカーを取得済み。
    pub async fn admit(
        &self,
        connection_id: &ConnectionId,
        frame: SnapshotFrame,
    ) -> Result<Submission, SnapshotError> {
        let admission = self
            .sessions
            .admit_snapshot(connection_id, frame.clone())
            .await;
        self.settle(connection_id, admission, frame).await
    }

    async fn settle(
        &self,
        connection_id: &ConnectionId,
        admission: Admission,
        frame: SnapshotFrame,
    ) -> Result<Submission, SnapshotError> {
        let result = self.accept(connection_id, admission, frame);
        match &result {
            Ok(Submission::Buffered) => {
                self.ack(
                    connection_id,
                    ServerEvent::snapshot_ack(SnapshotStatus::QueuedBeforeJoin),
                )
                .await;
            }
            Ok(Submission::Admitted(_)) => {}
            Err(e) => {
                tracing::warn!("Snapshot from '{}' rejected: {}", connection_id, e);
                self.ack(
                    connection_id,
                    ServerEvent::SnapshotAck {
                        status: e.status(),
                        reason: e.reason(),
                    },
                )
                .await;
            }
        }
        result
    }

    fn accept(
        &self,
        connection_id: &ConnectionId,
        admission: Admission,
        frame: SnapshotFrame,
    ) -> Result<Submission, SnapshotError> {
        let identity = match admission {
            Admission::Buffered { dropped } => {
                if dropped.is_some() {
                    tracing::debug!(
                        "Pre-join buffer full for '{}', dropped the oldest frame",
                        connection_id
                    );
                }
                return Ok(Submission::Buffered);
            }
            Admission::Unbound => return Err(SnapshotError::NotJoined),
            Admission::DetectionInactive => return Err(SnapshotError::DetectionInactive),
            Admission::Admitted { identity } => identity,
        };

        let identity = resolve_identity(identity, &frame);
        let Some(image) = frame.image.filter(|image| !image.is_empty()) else {
            return Err(SnapshotError::Validation("missing fields".to_string()));
        };

        let token = self
            .guards
            .try_acquire(&identity.student_id)
            .ok_or_else(|| SnapshotError::Busy(identity.student_id.as_str().to_string()))?;

        Ok(Submission::Admitted(AdmittedFrame {
            connection_id: connection_id.clone(),
            identity,
            image,
            token,
        }))
    }

    /// 外部分類サービスを呼び出し、結果を反映して ack を返す
    ///
    /// 送信元が切断済みでも結果は反映する（ack が届かないだけ）。
    pub async fn process(&self, admitted: AdmittedFrame) -> Result<EmotionUpdate, SnapshotError> {
        let AdmittedFrame {
            connection_id,
            identity,
            image,
            token,
        } = admitted;

        let outcome = match self.classify(image, &identity).await {
            Ok(raw) => Ok(self.apply(&identity, raw).await),
            Err(e) => Err(SnapshotError::from(e)),
        };
        drop(token);

        match &outcome {
            Ok(update) => {
                tracing::debug!(
                    "Classified '{}' as {} (engagement {})",
                    update.student_id,
                    update.emotion,
                    update.engagement.value()
                );
                self.ack(&connection_id, ServerEvent::snapshot_ack(SnapshotStatus::Ok))
                    .await;
            }
            Err(e) => {
                tracing::error!(
                    "Classification failed for '{}': {}",
                    identity.student_id,
                    e
                );
                self.ack(
                    &connection_id,
                    ServerEvent::SnapshotAck {
                        status: e.status(),
                        reason: e.reason(),
                    },
                )
                .await;
            }
        }
        outcome
    }

    /// 受付判定から反映までを 1 フレーム分まとめて実行する
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        frame: SnapshotFrame,
    ) -> Result<SnapshotOutcome, SnapshotError> {
        match self.admit(connection_id, frame).await? {
            Submission::Buffered => Ok(SnapshotOutcome::Buffered),
            Submission::Admitted(admitted) => {
                self.process(admitted).await.map(SnapshotOutcome::Classified)
            }
        }
    }

    /// join 前にバッファされていたフレームを受信順に 1 件ずつ処理する
    ///
    /// 途中で切断された場合、残りのフレームは捨てる。
    pub async fn replay(&self, connection_id: &ConnectionId, frames: Vec<SnapshotFrame>) {
        if frames.is_empty() {
            return;
        }
        tracing::info!(
            "Replaying {} buffered frame(s) for '{}'",
            frames.len(),
            connection_id
        );
        let total = frames.len();
        for (index, frame) in frames.into_iter().enumerate() {
            let admission = self.sessions.admit_replayed_snapshot(connection_id).await;
            if admission == Admission::Unbound {
                tracing::info!(
                    "'{}' disconnected during replay, discarding {} frame(s)",
                    connection_id,
                    total - index
                );
                return;
            }
            let result = match self.settle(connection_id, admission, frame).await {
                Ok(Submission::Admitted(admitted)) => self.process(admitted).await.map(|_| ()),
                Ok(Submission::Buffered) => Ok(()),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                tracing::debug!("Replayed frame for '{}' failed: {}", connection_id, e);
            }
        }
    }

    async fn classify(
        &self,
        image: String,
        identity: &Identity,
    ) -> Result<RawClassification, ClassifierError> {
        let request = ClassificationRequest::new(image, identity);
        let timeout = self.config.classifier_timeout;
        tokio::time::timeout(timeout, self.classifier.classify(request))
            .await
            .map_err(|_| ClassifierError::Timeout(timeout.as_millis() as u64))?
    }

    /// 正規化・スコアリングして集計・永続化・配信する
    async fn apply(&self, identity: &Identity, raw: RawClassification) -> EmotionUpdate {
        let student_id = raw
            .student_id
            .and_then(|id| StudentId::new(id).ok())
            .unwrap_or_else(|| identity.student_id.clone());
        let name = raw
            .name
            .filter(|name| !name.trim().is_empty())
            .map(|name| DisplayName::new(Some(name)))
            .unwrap_or_else(|| identity.name.clone());

        let normalized = normalize(raw.label.as_deref(), raw.confidence);
        let event = EmotionEvent {
            emotion: normalized.emotion,
            confidence: normalized.confidence,
            engagement: score(normalized.emotion, normalized.confidence),
            timestamp: Timestamp::new(self.clock.now_millis()),
        };

        self.aggregates
            .record(&identity.class_id, &student_id, &name, event)
            .await;
        self.persist(&identity.class_id, &student_id, &name, event)
            .await;

        let update = EmotionUpdate {
            student_id,
            name,
            emotion: event.emotion,
            confidence: event.confidence,
            engagement: event.engagement,
            timestamp: event.timestamp,
            face_box: raw.face_box,
            source: raw.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
        };
        self.router
            .to_room(&identity.class_id, ServerEvent::EmotionUpdate(update.clone()))
            .await;
        update
    }

    async fn persist(
        &self,
        class_id: &ClassId,
        student_id: &StudentId,
        name: &DisplayName,
        event: EmotionEvent,
    ) {
        let record = EmotionRecord {
            student_id: student_id.clone(),
            name: name.clone(),
            class_id: class_id.clone(),
            emotion: event.emotion,
            confidence: event.confidence,
            engagement: event.engagement,
            timestamp: event.timestamp,
        };
        if let Err(e) = self.emotion_log.insert(record).await {
            tracing::warn!("Failed to persist emotion for '{}': {}", student_id, e);
        }
    }

    async fn ack(&self, connection_id: &ConnectionId, event: ServerEvent) {
        self.router.to_connection(connection_id, event).await;
    }
}

/// フレームに含まれる身元の指定を、登録済みの身元より優先する
fn resolve_identity(identity: Identity, frame: &SnapshotFrame) -> Identity {
    let student_id = frame
        .student_id
        .clone()
        .and_then(|id| StudentId::new(id).ok())
        .unwrap_or(identity.student_id);
    let name = match frame.name.clone().filter(|name| !name.trim().is_empty()) {
        Some(name) => DisplayName::new(Some(name)),
        None => identity.name,
    };
    let class_id = frame
        .class_id
        .clone()
        .and_then(|id| ClassId::new(id).ok())
        .unwrap_or(identity.class_id);
    Identity::new(student_id, name, class_id)
}
