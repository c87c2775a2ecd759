//! 生徒ごとの分類リクエスト排他
//!
//! 1 人の生徒につき、同時に外部分類サービスへ送るリクエストは高々 1 件。
//! [`InFlightGuards::try_acquire`] が返すトークンを drop すると解放される。
//! 成功・失敗・タイムアウト・パニックのいずれの経路でも解放が保証される。

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

use super::value_object::StudentId;

#[derive(Debug, Clone, Default)]
pub struct InFlightGuards {
    active: Arc<Mutex<HashSet<StudentId>>>,
}

impl InFlightGuards {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<StudentId>> {
        // 保持中にパニックしても集合自体は壊れない
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 既に処理中なら `None`
    pub fn try_acquire(&self, student_id: &StudentId) -> Option<InFlightToken> {
        if !self.lock().insert(student_id.clone()) {
            return None;
        }
        Some(InFlightToken {
            student_id: student_id.clone(),
            guards: self.clone(),
        })
    }

    pub fn is_in_flight(&self, student_id: &StudentId) -> bool {
        self.lock().contains(student_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 処理中マーカー。drop 時に解放される
#[derive(Debug)]
pub struct InFlightToken {
    student_id: StudentId,
    guards: InFlightGuards,
}

impl InFlightToken {
    pub fn student_id(&self) -> &StudentId {
        &self.student_id
    }
}

impl Drop for InFlightToken {
    fn drop(&mut self) {
        self.guards.lock().remove(&self.student_id);
    }
}
