// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Side channel run for every completion when `auto_execute` is on.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use sidekick_core::{KeyValueStore, SidekickError, ToolExecution};
use tracing::info;

/// Storage key holding the persisted execution history.
pub const EXECUTION_LOG_KEY: &str = "automation.executions";

/// Records a completed tool execution. Independent of insert/submit.
#[async_trait]
pub trait ExecutionLogger: Send + Sync {
    async fn record(&self, execution: &ToolExecution) -> Result<(), SidekickError>;
}

/// Logs executions through `tracing` only.
#[derive(Debug, Default)]
pub struct TracingExecutionLogger;

#[async_trait]
impl ExecutionLogger for TracingExecutionLogger {
    async fn record(&self, execution: &ToolExecution) -> Result<(), SidekickError> {
        info!(
            function = execution.function_name.as_deref().unwrap_or("unknown"),
            call_id = execution.call_id.as_deref().unwrap_or(""),
            file = execution.is_file_attachment,
            "tool execution completed"
        );
        Ok(())
    }
}

/// Appends executions to a bounded list in the key/value store.
pub struct StoredExecutionLogger {
    storage: Arc<dyn KeyValueStore>,
    capacity: usize,
}

impl StoredExecutionLogger {
    pub fn new(storage: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        Self {
            storage,
            capacity: capacity.max(1),
        }
    }

    /// Entries currently persisted, oldest first.
    pub fn entries(&self) -> Vec<Value> {
        match self.storage.get(EXECUTION_LOG_KEY) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl ExecutionLogger for StoredExecutionLogger {
    async fn record(&self, execution: &ToolExecution) -> Result<(), SidekickError> {
        let mut entries = self.entries();
        entries.push(json!({
            "functionName": execution.function_name,
            "callId": execution.call_id,
            "isFileAttachment": execution.is_file_attachment,
            "resultLength": execution.result.as_ref().map(String::len),
            "recordedAt": Utc::now().to_rfc3339(),
        }));
        if entries.len() > self.capacity {
            let excess = entries.len() - self.capacity;
            entries.drain(..excess);
        }
        self.storage.set(EXECUTION_LOG_KEY, Value::Array(entries));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidekick_core::MemoryKeyValueStore;

    #[tokio::test]
    async fn stored_logger_keeps_the_newest_entries() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let logger = StoredExecutionLogger::new(storage.clone(), 2);

        for id in ["a", "b", "c"] {
            let execution = ToolExecution {
                call_id: Some(id.to_string()),
                ..ToolExecution::text("ok")
            };
            logger.record(&execution).await.unwrap();
        }

        let ids: Vec<String> = logger
            .entries()
            .iter()
            .map(|e| e["callId"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["b", "c"]);
    }
}
