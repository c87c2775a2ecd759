//! 外部感情分類サービスの抽象化

use async_trait::async_trait;

use super::{entity::Identity, error::ClassifierError};

/// 分類リクエスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRequest {
    pub image: String,
    pub student_id: String,
    pub name: String,
    pub class_id: String,
}

impl ClassificationRequest {
    pub fn new(image: String, identity: &Identity) -> Self {
        Self {
            image,
            student_id: identity.student_id.as_str().to_string(),
            name: identity.name.as_str().to_string(),
            class_id: identity.class_id.as_str().to_string(),
        }
    }
}

/// 正規化前の分類結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawClassification {
    pub label: Option<String>,
    /// 0〜1 または 0〜100
    pub confidence: f64,
    /// 顔の矩形。形式は分類サービス依存のためそのまま中継する
    pub face_box: Option<serde_json::Value>,
    pub source: Option<String>,
    pub student_id: Option<String>,
    pub name: Option<String>,
}

#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    async fn classify(
        &self,
        request: ClassificationRequest,
    ) -> Result<RawClassification, ClassifierError>;
}
