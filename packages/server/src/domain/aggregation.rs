//! Aggregation Store
//!
//! (クラス, 生徒) ごとの感情イベント履歴と統計を保持する唯一の書き込み先。

use std::collections::{HashMap, VecDeque};

use super::{
    entity::EmotionEvent,
    value_object::{ClassId, DisplayName, Emotion, StudentId, Timestamp},
};

/// 生徒ごとに保持する履歴の上限
pub const DEFAULT_HISTORY_CAPACITY: usize = 200;

/// サマリに含める直近イベント数
pub const DEFAULT_SUMMARY_SAMPLE: usize = 10;

/// 生徒ごとの集計
#[derive(Debug, Clone, PartialEq)]
pub struct StudentAggregate {
    pub name: DisplayName,
    history: VecDeque<EmotionEvent>,
    /// 初出順を保持するヒストグラム
    histogram: Vec<(Emotion, u64)>,
    total_engagement: u64,
    samples: u64,
    average: f64,
    last_seen: Option<Timestamp>,
}

impl StudentAggregate {
    fn new(name: DisplayName) -> Self {
        Self {
            name,
            history: VecDeque::new(),
            histogram: Vec::new(),
            total_engagement: 0,
            samples: 0,
            average: 0.0,
            last_seen: None,
        }
    }

    fn append(&mut self, event: EmotionEvent, capacity: usize) {
        self.history.push_back(event);
        while self.history.len() > capacity {
            self.history.pop_front();
        }

        match self.histogram.iter_mut().find(|(e, _)| *e == event.emotion) {
            Some((_, count)) => *count += 1,
            None => self.histogram.push((event.emotion, 1)),
        }

        self.total_engagement += u64::from(event.engagement.value());
        self.samples += 1;
        self.average = self.total_engagement as f64 / self.samples as f64;
        self.last_seen = Some(event.timestamp);
    }

    pub fn history(&self) -> &VecDeque<EmotionEvent> {
        &self.history
    }

    pub fn histogram(&self) -> &[(Emotion, u64)] {
        &self.histogram
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn average(&self) -> f64 {
        self.average
    }

    pub fn last_seen(&self) -> Option<Timestamp> {
        self.last_seen
    }

    /// 最頻の感情。同数の場合はヒストグラムに先に現れたもの
    pub fn dominant(&self) -> Option<Emotion> {
        let mut best: Option<(Emotion, u64)> = None;
        for &(emotion, count) in &self.histogram {
            if best.is_none_or(|(_, c)| count > c) {
                best = Some((emotion, count));
            }
        }
        best.map(|(emotion, _)| emotion)
    }
}

/// レポート用の生徒サマリ
#[derive(Debug, Clone, PartialEq)]
pub struct StudentSummary {
    pub student_id: StudentId,
    pub name: DisplayName,
    pub total_samples: u64,
    /// 小数第 2 位で丸めた平均
    pub average_engagement: f64,
    pub dominant_emotion: Option<Emotion>,
    pub counts: Vec<(Emotion, u64)>,
    pub last_seen: Option<Timestamp>,
    pub recent_events: Vec<EmotionEvent>,
}

#[derive(Debug)]
pub struct AggregationStore {
    classes: HashMap<ClassId, HashMap<StudentId, StudentAggregate>>,
    history_capacity: usize,
    summary_sample: usize,
}

impl Default for AggregationStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY, DEFAULT_SUMMARY_SAMPLE)
    }
}

impl AggregationStore {
    pub fn new(history_capacity: usize, summary_sample: usize) -> Self {
        Self {
            classes: HashMap::new(),
            history_capacity,
            summary_sample,
        }
    }

    /// イベントを追記する。生徒の集計が無ければ作成する（名前は初回のものを保持）
    pub fn record(
        &mut self,
        class_id: &ClassId,
        student_id: &StudentId,
        name: &DisplayName,
        event: EmotionEvent,
    ) {
        let capacity = self.history_capacity;
        self.classes
            .entry(class_id.clone())
            .or_default()
            .entry(student_id.clone())
            .or_insert_with(|| StudentAggregate::new(name.clone()))
            .append(event, capacity);
    }

    pub fn get(&self, class_id: &ClassId, student_id: &StudentId) -> Option<&StudentAggregate> {
        self.classes.get(class_id)?.get(student_id)
    }

    /// クラス内の全生徒のサマリ（生徒 ID 順）
    pub fn summarize(&self, class_id: &ClassId) -> Vec<StudentSummary> {
        let Some(students) = self.classes.get(class_id) else {
            return Vec::new();
        };

        let mut summaries: Vec<StudentSummary> = students
            .iter()
            .map(|(student_id, agg)| {
                let skip = agg.history.len().saturating_sub(self.summary_sample);
                StudentSummary {
                    student_id: student_id.clone(),
                    name: agg.name.clone(),
                    total_samples: agg.samples,
                    average_engagement: (agg.average * 100.0).round() / 100.0,
                    dominant_emotion: agg.dominant(),
                    counts: agg.histogram.clone(),
                    last_seen: agg.last_seen,
                    recent_events: agg.history.iter().skip(skip).copied().collect(),
                }
            })
            .collect();

        summaries.sort_by(|a, b| a.student_id.cmp(&b.student_id));
        summaries
    }
}
