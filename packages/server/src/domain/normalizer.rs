//! 分類結果の正規化
//!
//! 分類サービスが返すラベルの表記ゆれを固定語彙 [`Emotion`] に寄せ、
//! 0〜1 / 0〜100 のどちらでも届く信頼度を 0〜1 に揃える。

use super::value_object::{Confidence, Emotion};

/// 感情が検出されたときの信頼度の下限
pub const CONFIDENCE_FLOOR: f64 = 0.1;

/// 正規化済みの分類結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedResult {
    pub emotion: Emotion,
    pub confidence: Confidence,
}

/// ラベルを固定語彙に正規化する
///
/// 顔未検出・未知・空のラベルは全て `neutral`。
pub fn normalize_label(label: Option<&str>) -> Emotion {
    let Some(label) = label else {
        return Emotion::Neutral;
    };

    match label.trim().to_lowercase().as_str() {
        "happy" | "happiness" | "joy" | "joyful" | "hap" => Emotion::Happy,
        "sad" | "sadness" | "depressed" => Emotion::Sad,
        "angry" | "anger" | "furious" | "hate" => Emotion::Angry,
        "fear" | "fearful" | "afraid" | "scared" | "terrified" => Emotion::Fear,
        "disgust" | "disgusted" | "contempt" | "revolted" => Emotion::Disgust,
        "surprise" | "surprised" | "shocked" | "amazed" => Emotion::Surprise,
        _ => Emotion::Neutral,
    }
}

/// 信頼度を 0〜1 に正規化する
///
/// 1 を超える値はパーセント表記とみなして 100 で割る。
/// neutral 以外の感情では [`CONFIDENCE_FLOOR`] を下限とする。
pub fn normalize_confidence(raw: f64, emotion: Emotion) -> Confidence {
    let fraction = if raw > 1.0 { raw / 100.0 } else { raw };
    let confidence = Confidence::new(fraction);

    if emotion != Emotion::Neutral && confidence.value() < CONFIDENCE_FLOOR {
        Confidence::new(CONFIDENCE_FLOOR)
    } else {
        confidence
    }
}

pub fn normalize(label: Option<&str>, raw_confidence: f64) -> NormalizedResult {
    let emotion = normalize_label(label);
    NormalizedResult {
        emotion,
        confidence: normalize_confidence(raw_confidence, emotion),
    }
}
