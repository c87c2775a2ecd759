//! Session Registry
//!
//! 接続と生徒の身元の対応、クラスの有効化状態、検出の ON/OFF、
//! join 前に届いたスナップショットのバッファを保持する。
//!
//! 全ての操作は同期的な状態遷移で、I/O を行わない。
//! 通知（ブロードキャスト）は呼び出し側が戻り値をもとに行う。

use std::collections::{HashMap, VecDeque};

use super::{
    entity::{Identity, RosterEntry, SnapshotFrame},
    error::RepositoryError,
    value_object::{ClassId, ConnectionId},
};

/// join 前にバッファできるフレーム数の既定値
pub const DEFAULT_PENDING_CAPACITY: usize = 3;

/// クラスルーム
///
/// 教師が一度でも join すると `active` になり、プロセスが終了するまで残る。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRoom {
    pub id: ClassId,
    pub active: bool,
    /// 未設定は有効として扱う
    pub detection_enabled: Option<bool>,
    /// ルームに参加している接続（教師・生徒の両方）
    pub members: Vec<ConnectionId>,
}

impl ClassRoom {
    fn new(id: ClassId) -> Self {
        Self {
            id,
            active: false,
            detection_enabled: None,
            members: Vec::new(),
        }
    }

    fn add_member(&mut self, connection_id: &ConnectionId) {
        if !self.members.contains(connection_id) {
            self.members.push(connection_id.clone());
        }
    }

    fn remove_member(&mut self, connection_id: &ConnectionId) {
        self.members.retain(|m| m != connection_id);
    }

    pub fn is_detection_enabled(&self) -> bool {
        self.detection_enabled.unwrap_or(true)
    }
}

/// 生徒 join の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentJoined {
    pub identity: Identity,
    /// join 前にバッファされていたフレーム（受信順）
    pub replay: Vec<SnapshotFrame>,
}

/// スナップショット受付判定の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// 身元が未登録のためバッファした。容量超過で捨てたフレームがあれば返す
    Buffered { dropped: Option<SnapshotFrame> },
    /// 身元が解除済み（再処理中に切断された）
    Unbound,
    /// クラスの検出が停止中
    DetectionInactive,
    /// 分類に進める
    Admitted { identity: Identity },
}

#[derive(Debug)]
pub struct SessionRegistry {
    bindings: HashMap<ConnectionId, Identity>,
    rooms: HashMap<ClassId, ClassRoom>,
    pending: HashMap<ConnectionId, VecDeque<SnapshotFrame>>,
    pending_capacity: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_PENDING_CAPACITY)
    }
}

impl SessionRegistry {
    pub fn new(pending_capacity: usize) -> Self {
        Self {
            bindings: HashMap::new(),
            rooms: HashMap::new(),
            pending: HashMap::new(),
            pending_capacity,
        }
    }

    fn room_mut(&mut self, class_id: &ClassId) -> &mut ClassRoom {
        self.rooms
            .entry(class_id.clone())
            .or_insert_with(|| ClassRoom::new(class_id.clone()))
    }

    /// 教師の join: クラスを有効化し、接続をルームに追加して現在の名簿を返す（冪等）
    pub fn teacher_join(
        &mut self,
        connection_id: &ConnectionId,
        class_id: &ClassId,
    ) -> Vec<RosterEntry> {
        let room = self.room_mut(class_id);
        room.active = true;
        room.add_member(connection_id);
        self.roster(class_id)
    }

    /// 生徒の join
    ///
    /// クラスが有効でなければ [`RepositoryError::ClassNotActive`]。状態は変更しない。
    /// 同じ接続で別のクラスに join し直した場合は、古いルームから外す。
    pub fn student_join(
        &mut self,
        connection_id: &ConnectionId,
        identity: Identity,
    ) -> Result<StudentJoined, RepositoryError> {
        if !self.is_active(&identity.class_id) {
            return Err(RepositoryError::ClassNotActive(
                identity.class_id.as_str().to_string(),
            ));
        }

        let previous_class = self
            .bindings
            .get(connection_id)
            .map(|previous| previous.class_id.clone())
            .filter(|previous| previous != &identity.class_id);
        if let Some(previous_class) = previous_class {
            self.room_mut(&previous_class).remove_member(connection_id);
        }

        self.room_mut(&identity.class_id).add_member(connection_id);
        self.bindings
            .insert(connection_id.clone(), identity.clone());

        let replay = self
            .pending
            .remove(connection_id)
            .map(Vec::from)
            .unwrap_or_default();

        Ok(StudentJoined { identity, replay })
    }

    /// 切断: 接続に紐づく全ての状態を解放し、身元があれば返す
    pub fn disconnect(&mut self, connection_id: &ConnectionId) -> Option<Identity> {
        self.pending.remove(connection_id);
        for room in self.rooms.values_mut() {
            room.remove_member(connection_id);
        }
        self.bindings.remove(connection_id)
    }

    /// 検出の ON/OFF を切り替える（未知のクラスでも設定は保持する）
    pub fn set_detection(&mut self, class_id: &ClassId, enabled: bool) {
        self.room_mut(class_id).detection_enabled = Some(enabled);
    }

    /// スナップショットの受付判定
    ///
    /// 身元未登録ならバッファする。容量を超えた場合は最も古いフレームを捨てる。
    pub fn admit_snapshot(
        &mut self,
        connection_id: &ConnectionId,
        frame: SnapshotFrame,
    ) -> Admission {
        let Some(identity) = self.bindings.get(connection_id).cloned() else {
            let capacity = self.pending_capacity;
            let queue = self.pending.entry(connection_id.clone()).or_default();
            queue.push_back(frame);
            let dropped = if queue.len() > capacity {
                queue.pop_front()
            } else {
                None
            };
            return Admission::Buffered { dropped };
        };
        self.admit_bound(identity)
    }

    /// バッファから取り出したフレームの受付判定
    ///
    /// 切断済みの接続では [`Admission::Unbound`] を返し、再びバッファすることはない。
    pub fn admit_replayed_snapshot(&self, connection_id: &ConnectionId) -> Admission {
        match self.bindings.get(connection_id) {
            Some(identity) => self.admit_bound(identity.clone()),
            None => Admission::Unbound,
        }
    }

    fn admit_bound(&self, identity: Identity) -> Admission {
        if !self.is_detection_enabled(&identity.class_id) {
            return Admission::DetectionInactive;
        }
        Admission::Admitted { identity }
    }

    pub fn identity(&self, connection_id: &ConnectionId) -> Option<&Identity> {
        self.bindings.get(connection_id)
    }

    pub fn is_active(&self, class_id: &ClassId) -> bool {
        self.rooms.get(class_id).is_some_and(|r| r.active)
    }

    pub fn is_detection_enabled(&self, class_id: &ClassId) -> bool {
        self.rooms
            .get(class_id)
            .is_none_or(ClassRoom::is_detection_enabled)
    }

    /// ルームに参加している接続の一覧（ブロードキャスト時点のスナップショット）
    pub fn room_members(&self, class_id: &ClassId) -> Vec<ConnectionId> {
        self.rooms
            .get(class_id)
            .map(|r| r.members.clone())
            .unwrap_or_default()
    }

    /// クラスの名簿（生徒 ID 順）
    pub fn roster(&self, class_id: &ClassId) -> Vec<RosterEntry> {
        let mut roster: Vec<RosterEntry> = self
            .bindings
            .iter()
            .filter(|(_, identity)| &identity.class_id == class_id)
            .map(|(connection_id, identity)| RosterEntry {
                student_id: identity.student_id.clone(),
                name: identity.name.clone(),
                connection_id: connection_id.clone(),
            })
            .collect();

        roster.sort_by(|a, b| {
            a.student_id
                .cmp(&b.student_id)
                .then_with(|| a.connection_id.cmp(&b.connection_id))
        });
        roster
    }

    pub fn pending_len(&self, connection_id: &ConnectionId) -> usize {
        self.pending.get(connection_id).map_or(0, VecDeque::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{DisplayName, StudentId};

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    fn class(id: &str) -> ClassId {
        ClassId::new(id.to_string()).unwrap()
    }

    fn identity(student: &str, class_id: &str) -> Identity {
        Identity::new(
            StudentId::new(student.to_string()).unwrap(),
            DisplayName::new(Some(student.to_uppercase())),
            class(class_id),
        )
    }

    fn frame(image: &str) -> SnapshotFrame {
        SnapshotFrame {
            image: Some(image.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_student_join_requires_active_class() {
        // テスト項目: 教師が join していないクラスへの生徒 join は拒否され、状態は変わらない
        // given (前提条件):
        let mut registry = SessionRegistry::default();

        // when (操作):
        let result = registry.student_join(&conn("c1"), identity("alice", "math"));

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RepositoryError::ClassNotActive("math".to_string()))
        );
        assert!(registry.identity(&conn("c1")).is_none());
        assert!(registry.room_members(&class("math")).is_empty());
    }

    #[test]
    fn test_student_join_after_teacher_join() {
        // テスト項目: 教師の join 後なら生徒は join でき、ルームのメンバーになる
        // given (前提条件):
        let mut registry = SessionRegistry::default();
        registry.teacher_join(&conn("t1"), &class("math"));

        // when (操作):
        let joined = registry
            .student_join(&conn("c1"), identity("alice", "math"))
            .unwrap();

        // then (期待する結果):
        assert_eq!(joined.identity.student_id.as_str(), "alice");
        assert!(joined.replay.is_empty());
        assert_eq!(
            registry.room_members(&class("math")),
            vec![conn("t1"), conn("c1")]
        );
    }

    #[test]
    fn test_teacher_join_is_idempotent_and_returns_roster() {
        // テスト項目: 教師の join は冪等で、名簿は生徒 ID 順に返る
        // given (前提条件):
        let mut registry = SessionRegistry::default();
        registry.teacher_join(&conn("t1"), &class("math"));
        registry
            .student_join(&conn("c2"), identity("bob", "math"))
            .unwrap();
        registry
            .student_join(&conn("c1"), identity("alice", "math"))
            .unwrap();

        // when (操作):
        let roster = registry.teacher_join(&conn("t1"), &class("math"));

        // then (期待する結果):
        let ids: Vec<&str> = roster.iter().map(|r| r.student_id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob"]);
        assert_eq!(registry.room_members(&class("math")).len(), 3);
    }

    #[test]
    fn test_disconnect_releases_all_state() {
        // テスト項目: 切断すると身元・ルーム参加・バッファが全て解放される
        // given (前提条件):
        let mut registry = SessionRegistry::default();
        registry.teacher_join(&conn("t1"), &class("math"));
        registry
            .student_join(&conn("c1"), identity("alice", "math"))
            .unwrap();
        registry.admit_snapshot(&conn("c9"), frame("early"));

        // when (操作):
        let left = registry.disconnect(&conn("c1"));
        let unbound = registry.disconnect(&conn("c9"));

        // then (期待する結果):
        assert_eq!(left.unwrap().student_id.as_str(), "alice");
        assert!(unbound.is_none());
        assert_eq!(registry.pending_len(&conn("c9")), 0);
        assert_eq!(registry.room_members(&class("math")), vec![conn("t1")]);
        assert!(registry.roster(&class("math")).is_empty());
    }

    #[test]
    fn test_pending_buffer_drops_oldest_and_replays_in_order() {
        // テスト項目: join 前のフレームは 3 件までバッファされ、4 件目で最古が捨てられる
        // given (前提条件):
        let mut registry = SessionRegistry::default();
        registry.teacher_join(&conn("t1"), &class("math"));
        let c1 = conn("c1");

        // when (操作):
        let results: Vec<Admission> = ["f1", "f2", "f3", "f4"]
            .into_iter()
            .map(|f| registry.admit_snapshot(&c1, frame(f)))
            .collect();
        let joined = registry
            .student_join(&c1, identity("alice", "math"))
            .unwrap();

        // then (期待する結果):
        assert_eq!(results[0], Admission::Buffered { dropped: None });
        assert_eq!(results[2], Admission::Buffered { dropped: None });
        assert_eq!(
            results[3],
            Admission::Buffered {
                dropped: Some(frame("f1"))
            }
        );
        let replayed: Vec<&str> = joined
            .replay
            .iter()
            .map(|f| f.image.as_deref().unwrap())
            .collect();
        assert_eq!(replayed, vec!["f2", "f3", "f4"]);
        assert_eq!(registry.pending_len(&c1), 0);
    }

    #[test]
    fn test_replayed_snapshot_after_disconnect_is_not_buffered() {
        // テスト項目: 再処理中に切断された接続のフレームは再びバッファされない
        // given (前提条件):
        let mut registry = SessionRegistry::default();
        registry.teacher_join(&conn("t1"), &class("math"));
        let c1 = conn("c1");
        registry.admit_snapshot(&c1, frame("f1"));
        registry.student_join(&c1, identity("alice", "math")).unwrap();
        let bound = registry.admit_replayed_snapshot(&c1);

        // when (操作):
        registry.disconnect(&c1);
        let unbound = registry.admit_replayed_snapshot(&c1);

        // then (期待する結果):
        assert!(matches!(bound, Admission::Admitted { .. }));
        assert_eq!(unbound, Admission::Unbound);
        assert_eq!(registry.pending_len(&c1), 0);
    }

    #[test]
    fn test_detection_toggle_controls_admission() {
        // テスト項目: 検出停止中のクラスではフレームが受け付けられない
        // given (前提条件):
        let mut registry = SessionRegistry::default();
        registry.teacher_join(&conn("t1"), &class("math"));
        registry
            .student_join(&conn("c1"), identity("alice", "math"))
            .unwrap();
        assert!(registry.is_detection_enabled(&class("math")));

        // when (操作):
        registry.set_detection(&class("math"), false);
        let paused = registry.admit_snapshot(&conn("c1"), frame("x"));
        registry.set_detection(&class("math"), true);
        let resumed = registry.admit_snapshot(&conn("c1"), frame("y"));

        // then (期待する結果):
        assert_eq!(paused, Admission::DetectionInactive);
        assert!(matches!(resumed, Admission::Admitted { .. }));
    }

    #[test]
    fn test_rejoin_moves_connection_between_rooms() {
        // テスト項目: 別クラスへ再 join すると古いルームから外れる（後勝ち）
        // given (前提条件):
        let mut registry = SessionRegistry::default();
        registry.teacher_join(&conn("t1"), &class("math"));
        registry.teacher_join(&conn("t2"), &class("art"));
        registry
            .student_join(&conn("c1"), identity("alice", "math"))
            .unwrap();

        // when (操作):
        registry
            .student_join(&conn("c1"), identity("alice", "art"))
            .unwrap();

        // then (期待する結果):
        assert_eq!(registry.room_members(&class("math")), vec![conn("t1")]);
        assert_eq!(
            registry.room_members(&class("art")),
            vec![conn("t2"), conn("c1")]
        );
        assert_eq!(
            registry.identity(&conn("c1")).unwrap().class_id,
            class("art")
        );
    }
}
