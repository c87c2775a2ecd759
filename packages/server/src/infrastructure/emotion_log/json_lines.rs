//! JSON Lines 形式のファイルに追記する EmotionLog 実装

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::Mutex};

use crate::domain::{EmotionLog, EmotionLogError, EmotionRecord};
use classmood_shared::time::timestamp_to_rfc3339;

/// ファイルに書き出す 1 行分のドキュメント
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmotionDocument<'a> {
    #[serde(flatten)]
    record: &'a EmotionRecord,
    recorded_at: String,
}

pub struct JsonLinesEmotionLog {
    path: PathBuf,
    /// 1 行が途中で混ざらないように書き込みを直列化する
    write_lock: Mutex<()>,
}

impl JsonLinesEmotionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl EmotionLog for JsonLinesEmotionLog {
    async fn insert(&self, record: EmotionRecord) -> Result<(), EmotionLogError> {
        let document = EmotionDocument {
            record: &record,
            recorded_at: timestamp_to_rfc3339(record.timestamp.value()),
        };
        let mut line = serde_json::to_string(&document)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| EmotionLogError::WriteFailed(e.to_string()))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| EmotionLogError::WriteFailed(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| EmotionLogError::WriteFailed(e.to_string()))?;
        Ok(())
    }
}
