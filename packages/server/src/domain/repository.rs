//! Repository trait 定義
//!
//! ドメイン層が必要とする状態アクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    aggregation::StudentSummary,
    entity::{EmotionEvent, Identity, RosterEntry, SnapshotFrame},
    error::RepositoryError,
    session::{Admission, StudentJoined},
    value_object::{ClassId, ConnectionId, DisplayName, StudentId},
};

/// Session Registry へのアクセス
///
/// 各メソッドは 1 回の状態遷移として原子的に実行される。
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// クラスを有効化し、現在の名簿を返す
    async fn teacher_join(
        &self,
        connection_id: &ConnectionId,
        class_id: &ClassId,
    ) -> Vec<RosterEntry>;

    /// 生徒の身元を接続に紐づける
    async fn student_join(
        &self,
        connection_id: &ConnectionId,
        identity: Identity,
    ) -> Result<StudentJoined, RepositoryError>;

    /// 接続に紐づく状態を解放する
    async fn disconnect(&self, connection_id: &ConnectionId) -> Option<Identity>;

    async fn set_detection(&self, class_id: &ClassId, enabled: bool);

    /// スナップショットの受付判定（必要ならバッファ）
    async fn admit_snapshot(
        &self,
        connection_id: &ConnectionId,
        frame: SnapshotFrame,
    ) -> Admission;

    /// join 後に再処理するフレームの受付判定（バッファしない）
    async fn admit_replayed_snapshot(&self, connection_id: &ConnectionId) -> Admission;

    async fn identity(&self, connection_id: &ConnectionId) -> Option<Identity>;

    async fn is_active(&self, class_id: &ClassId) -> bool;

    /// ルームの参加者（ブロードキャスト対象）
    async fn room_members(&self, class_id: &ClassId) -> Vec<ConnectionId>;

    async fn roster(&self, class_id: &ClassId) -> Vec<RosterEntry>;
}

/// Aggregation Store へのアクセス
#[async_trait]
pub trait AggregateRepository: Send + Sync {
    async fn record(
        &self,
        class_id: &ClassId,
        student_id: &StudentId,
        name: &DisplayName,
        event: EmotionEvent,
    );

    async fn summarize(&self, class_id: &ClassId) -> Vec<StudentSummary>;
}
