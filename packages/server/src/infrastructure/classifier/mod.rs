//! 外部感情分類サービスのクライアント実装

pub mod http;

pub use http::HttpEmotionClassifier;
