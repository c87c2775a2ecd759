//! HTTP reporting API response DTOs.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;

use super::websocket::RosterMemberDto;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthDto {
    pub success: bool,
    /// Unix timestamp (milliseconds)
    pub ts: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterDto {
    pub success: bool,
    pub roster: Vec<RosterMemberDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionEventDto {
    pub emotion: String,
    pub confidence: f64,
    pub engagement: u8,
    /// RFC 3339
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummaryDto {
    pub student_id: String,
    pub name: String,
    pub total_samples: u64,
    pub avg_engagement: f64,
    pub dominant_emotion: Option<String>,
    /// 初めて記録された順（dominant の同数判定と同じ順序）
    pub counts: IndexMap<String, u64>,
    pub last_seen: Option<String>,
    pub events_sample: Vec<EmotionEventDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSummaryDto {
    pub success: bool,
    /// Key: studentId
    pub summary: BTreeMap<String, StudentSummaryDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassCheckDto {
    pub success: bool,
    pub exists: bool,
    pub class_id: String,
}
