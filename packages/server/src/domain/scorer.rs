//! エンゲージメントスコア算出（純粋関数）
//!
//! ```text
//! score = round(clamp(50 + weight * (0.7 + 0.5 * confidence), 0, 100))
//! ```
//!
//! 信頼度が低い検出は捨てずにベースライン 50 へ寄せる。

use super::value_object::{Confidence, Emotion, Engagement};

const BASELINE: f64 = 50.0;
const DAMPING_MIN: f64 = 0.7;
const DAMPING_SPAN: f64 = 0.5;

/// ラベルごとの重み。未知のラベルは 0。
pub fn label_weight(label: &str) -> i32 {
    match label.trim().to_lowercase().as_str() {
        "happy" => 30,
        "surprise" => 20,
        "neutral" => 10,
        "sad" => -20,
        "fear" => -25,
        "disgust" => -30,
        "angry" => -35,
        "no_face" | "no face" => -60,
        _ => 0,
    }
}

/// 正規化前のラベル文字列からスコアを算出
pub fn score_label(label: &str, confidence: f64) -> Engagement {
    let confidence = Confidence::new(confidence).value();
    let damping = DAMPING_MIN + DAMPING_SPAN * confidence;
    let raw = BASELINE + f64::from(label_weight(label)) * damping;
    Engagement::new(raw.clamp(0.0, 100.0).round() as u8)
}

/// 正規化済みの感情からスコアを算出
pub fn score(emotion: Emotion, confidence: Confidence) -> Engagement {
    score_label(emotion.as_str(), confidence.value())
}
