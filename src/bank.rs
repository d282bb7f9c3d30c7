use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info};
use tokio::sync::Mutex;

use crate::model::question::QuestionBank;

/// Where the question bank comes from. The first successful load is cached;
/// a failed load is retried on the next request.
pub struct QuestionSource {
    path: Option<PathBuf>,
    cached: Mutex<Option<Arc<QuestionBank>>>,
}

impl QuestionSource {
    pub fn from_path(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            cached: Mutex::new(None),
        }
    }

    /// An already-loaded bank, used by tests and embedders.
    pub fn preloaded(bank: QuestionBank) -> Self {
        Self {
            path: None,
            cached: Mutex::new(Some(Arc::new(bank))),
        }
    }

    pub async fn get(&self) -> Result<Arc<QuestionBank>> {
        let mut cached = self.cached.lock().await;
        if let Some(bank) = cached.as_ref() {
            return Ok(bank.clone());
        }

        let path = self
            .path
            .as_ref()
            .context("no question bank configured")?;
        let bank = Self::load(path).await.inspect_err(|e| {
            error!("Error loading question bank from {}: {e:#}", path.display());
        })?;
        info!(
            "Loaded question bank \"{}\" with {} questions",
            bank.title,
            bank.questions.len()
        );
        let bank = Arc::new(bank);
        *cached = Some(bank.clone());
        Ok(bank)
    }

    async fn load(path: &Path) -> Result<QuestionBank> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        QuestionBank::from_json(&text)
    }
}
