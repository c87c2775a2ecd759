//! 感情ログ（ベストエフォートの永続化）の実装
//!
//! - `json_lines`: 1 レコード 1 行の JSON をファイルに追記
//! - `disabled`: 永続化しない（保存先が設定されていない場合）

pub mod disabled;
pub mod json_lines;

pub use disabled::DisabledEmotionLog;
pub use json_lines::JsonLinesEmotionLog;
