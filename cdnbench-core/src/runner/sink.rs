use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt as _;
use uuid::Uuid;

use super::error::Result;
use super::summary::ScenarioSummary;

pub type SinkFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Durable destination for completed scenario summaries.
pub trait ResultSink: Send + Sync {
    fn name(&self) -> &'static str;

    fn store<'a>(&'a self, summary: &'a ScenarioSummary) -> SinkFuture<'a>;
}

/// One persisted result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub id: Uuid,
    pub summary: ScenarioSummary,
}

/// Appends one JSON object per line to a file.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, summary: &ScenarioSummary) -> Result<()> {
        let record = SummaryRecord {
            id: Uuid::new_v4(),
            summary: summary.clone(),
        };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

impl ResultSink for JsonLinesSink {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    fn store<'a>(&'a self, summary: &'a ScenarioSummary) -> SinkFuture<'a> {
        Box::pin(self.append(summary))
    }
}
