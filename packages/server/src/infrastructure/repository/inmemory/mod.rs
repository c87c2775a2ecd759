//! InMemory Repository 実装
//!
//! ドメインモデル（`SessionRegistry`, `AggregationStore`）を `Mutex` で包み、
//! そのままストレージとして使用します。1 回のメソッド呼び出しが 1 回の
//! ロック区間になるため、各状態遷移は他のイベントと交錯しません。

pub mod aggregate;
pub mod session;

pub use aggregate::InMemoryAggregateRepository;
pub use session::InMemorySessionRepository;
