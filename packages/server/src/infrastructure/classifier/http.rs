//! HTTP (JSON) で分類サービスを呼び出す EmotionClassifier 実装
//!
//! リクエスト: `POST {url}` に `{image, studentId, name, classId}`
//! レスポンス: `{success?, emotion, confidence, box?, source?, studentId?, name?}`
//!
//! タイムアウトはパイプライン側で強制するため、ここでは設定しない。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ClassificationRequest, ClassifierError, EmotionClassifier, RawClassification};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest<'a> {
    image: &'a str,
    student_id: &'a str,
    name: &'a str,
    class_id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse {
    success: Option<bool>,
    error: Option<String>,
    emotion: Option<String>,
    confidence: Option<Value>,
    #[serde(rename = "box")]
    face_box: Option<Value>,
    source: Option<String>,
    student_id: Option<String>,
    name: Option<String>,
}

impl AnalyzeResponse {
    fn into_raw(self) -> Result<RawClassification, ClassifierError> {
        if self.success == Some(false) || (self.error.is_some() && self.emotion.is_none()) {
            return Err(ClassifierError::Rejected(
                self.error
                    .unwrap_or_else(|| "classifier reported failure".to_string()),
            ));
        }

        Ok(RawClassification {
            label: self.emotion,
            confidence: parse_confidence(self.confidence.as_ref()),
            face_box: self.face_box.filter(|b| !b.is_null()),
            source: self.source,
            student_id: self.student_id.filter(|s| !s.is_empty()),
            name: self.name.filter(|s| !s.is_empty()),
        })
    }
}

/// 数値・数値文字列のどちらも受け付ける。解釈できなければ 0
fn parse_confidence(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

pub struct HttpEmotionClassifier {
    client: reqwest::Client,
    url: String,
}

impl HttpEmotionClassifier {
    pub fn new(url: String) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EmotionClassifier for HttpEmotionClassifier {
    async fn classify(
        &self,
        request: ClassificationRequest,
    ) -> Result<RawClassification, ClassifierError> {
        let body = AnalyzeRequest {
            image: &request.image,
            student_id: &request.student_id,
            name: &request.name,
            class_id: &request.class_id,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<AnalyzeResponse>()
                .await
                .ok()
                .and_then(|r| r.error)
                .unwrap_or_default();
            tracing::error!(
                "Classifier responded with status {} for student '{}': {}",
                status,
                request.student_id,
                detail
            );
            return Err(ClassifierError::Transport(format!(
                "status {status}: {detail}"
            )));
        }

        response
            .json::<AnalyzeResponse>()
            .await
            .map_err(|e| ClassifierError::InvalidResponse(e.to_string()))?
            .into_raw()
    }
}
