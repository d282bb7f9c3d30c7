use crate::model::result::{StoredResult, SubmittedResult};
use anyhow::{Context, Result};
use log::{info, warn};
use reqwest::Client as HttpClient;
use tokio::sync::Mutex;
use url::Url;

const RESULTS_TABLE_PATH: &str = "rest/v1/quiz_results";

enum Backend {
    /// Hosted REST table.
    Remote {
        http: HttpClient,
        table_url: Url,
        api_key: String,
    },
    /// Local runs and tests keep results in memory.
    Memory(Mutex<Vec<StoredResult>>),
}

pub struct PersistenceClient {
    backend: Backend,
}

impl PersistenceClient {
    /// `base_url` is the service root, e.g. `https://project.example.co`.
    pub fn remote(base_url: &str, api_key: String) -> Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("invalid persistence URL {base_url}"))?;
        let table_url = base.join(RESULTS_TABLE_PATH)?;
        info!("Result persistence enabled at {table_url}");
        Ok(PersistenceClient {
            backend: Backend::Remote {
                http: HttpClient::new(),
                table_url,
                api_key,
            },
        })
    }

    pub fn in_memory() -> Self {
        info!("No persistence URL configured, results are kept in memory");
        PersistenceClient {
            backend: Backend::Memory(Mutex::new(Vec::new())),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.backend, Backend::Remote { .. })
    }

    /// Store one completed result. `is_admin` marks admin/test submissions.
    pub async fn insert_result(&self, result: &SubmittedResult, is_admin: bool) -> Result<()> {
        let row = StoredResult {
            id: None,
            result: result.clone(),
            is_admin,
        };

        match &self.backend {
            Backend::Remote {
                http,
                table_url,
                api_key,
            } => {
                http.post(table_url.clone())
                    .header("apikey", api_key)
                    .bearer_auth(api_key)
                    .header("Prefer", "return=minimal")
                    .json(&[&row])
                    .send()
                    .await?
                    .error_for_status()?;
            }
            Backend::Memory(rows) => {
                let mut rows = rows.lock().await;
                let id = rows.len() as i64 + 1;
                rows.push(StoredResult { id: Some(id), ..row });
            }
        }

        info!(
            "Saved result for {} ({}/{})",
            result.user_name, result.score, result.total_questions
        );
        Ok(())
    }

    /// Every stored result, highest score first.
    pub async fn list_results(&self) -> Result<Vec<StoredResult>> {
        match &self.backend {
            Backend::Remote {
                http,
                table_url,
                api_key,
            } => {
                let mut url = table_url.clone();
                url.query_pairs_mut()
                    .append_pair("select", "*")
                    .append_pair("order", "score.desc");
                let rows = http
                    .get(url)
                    .header("apikey", api_key)
                    .bearer_auth(api_key)
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<Vec<StoredResult>>()
                    .await
                    .map_err(|e| {
                        warn!("Stored results did not match the expected shape: {e}");
                        e
                    })?;
                Ok(rows)
            }
            Backend::Memory(rows) => {
                let mut rows = rows.lock().await.clone();
                // Stable, so equal scores keep insertion order.
                rows.sort_by(|a, b| b.result.score.cmp(&a.result.score));
                Ok(rows)
            }
        }
    }
}
