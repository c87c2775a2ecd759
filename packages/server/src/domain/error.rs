//! ドメイン層のエラー定義

use thiserror::Error;

/// 値オブジェクト生成時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// 必須フィールドが空
    #[error("'{0}' must not be empty")]
    Empty(&'static str),
}

/// Repository 操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// クラスが有効化されていない
    #[error("class '{0}' is not active")]
    ClassNotActive(String),
}

/// メッセージ送信（通知）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// 送信先の接続が登録されていない
    #[error("connection '{0}' is not registered")]
    ClientNotFound(String),

    /// ワイヤ形式への変換に失敗
    #[error("failed to encode event: {0}")]
    Encode(String),

    /// チャンネルへの送信に失敗
    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// 外部感情分類サービスのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifierError {
    /// 応答がタイムアウトした
    #[error("classifier timed out after {0} ms")]
    Timeout(u64),

    /// 通信エラー、または 2xx 以外のステータス
    #[error("classifier transport error: {0}")]
    Transport(String),

    /// 分類サービスが明示的に失敗を返した
    #[error("classifier rejected the frame: {0}")]
    Rejected(String),

    /// 応答ボディを解釈できない
    #[error("invalid classifier response: {0}")]
    InvalidResponse(String),
}

/// 永続化（感情ログ）のエラー
#[derive(Debug, Error)]
pub enum EmotionLogError {
    #[error("failed to serialize emotion record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write emotion record: {0}")]
    WriteFailed(String),
}
