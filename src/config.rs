use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

use crate::leaderboard::DEFAULT_LEADERBOARD_SIZE;
use crate::model::question::QuestionBank;
use crate::model::session::{DEFAULT_HINT_QUOTA, SessionSettings};

#[derive(Debug, Clone)]
pub struct Config {
    pub ws_addr: String,
    pub http_addr: String,
    pub bank_path: PathBuf,
    pub roster_path: PathBuf,
    /// Overrides the bank's own time limit when set.
    pub time_budget_secs: Option<u32>,
    pub hint_quota: u32,
    pub tick_interval: Duration,
    pub refresh_interval: Duration,
    pub leaderboard_size: usize,
    pub persistence_url: Option<String>,
    pub persistence_api_key: Option<String>,
    pub auth_secret: String,
}

impl Config {
    /// Read configuration from the process environment (after `.env`).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_vars(&std::env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        fn parse<T: std::str::FromStr>(key: &str, value: Option<&str>) -> Result<Option<T>>
        where
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            value
                .map(|v| v.parse::<T>().with_context(|| format!("{key} has invalid value {v:?}")))
                .transpose()
        }

        let auth_secret = get("QUIZ_AUTH_SECRET")
            .ok_or_else(|| anyhow!("QUIZ_AUTH_SECRET must be set to enable the admin dashboard"))?
            .to_string();

        let persistence_url = get("PERSISTENCE_URL").map(str::to_string);
        let persistence_api_key = get("PERSISTENCE_API_KEY").map(str::to_string);
        if persistence_url.is_some() && persistence_api_key.is_none() {
            return Err(anyhow!("PERSISTENCE_API_KEY is required when PERSISTENCE_URL is set"));
        }

        let refresh_secs = parse("QUIZ_REFRESH_SECS", get("QUIZ_REFRESH_SECS"))?.unwrap_or(30);
        if refresh_secs == 0 {
            return Err(anyhow!("QUIZ_REFRESH_SECS must be at least 1"));
        }

        let time_budget_secs = parse("QUIZ_TIME_BUDGET_SECS", get("QUIZ_TIME_BUDGET_SECS"))?;
        if time_budget_secs == Some(0) {
            return Err(anyhow!("QUIZ_TIME_BUDGET_SECS must be at least 1"));
        }

        Ok(Config {
            ws_addr: get("QUIZ_WS_ADDR").unwrap_or("0.0.0.0:9002").to_string(),
            http_addr: get("QUIZ_HTTP_ADDR").unwrap_or("0.0.0.0:8080").to_string(),
            bank_path: get("QUIZ_BANK_PATH")
                .unwrap_or("data/questions.json")
                .into(),
            roster_path: get("QUIZ_ROSTER_PATH")
                .unwrap_or("data/roster.json")
                .into(),
            time_budget_secs,
            hint_quota: parse("QUIZ_HINT_QUOTA", get("QUIZ_HINT_QUOTA"))?
                .unwrap_or(DEFAULT_HINT_QUOTA),
            tick_interval: Duration::from_secs(1),
            refresh_interval: Duration::from_secs(refresh_secs),
            leaderboard_size: parse("QUIZ_LEADERBOARD_SIZE", get("QUIZ_LEADERBOARD_SIZE"))?
                .unwrap_or(DEFAULT_LEADERBOARD_SIZE),
            persistence_url,
            persistence_api_key,
            auth_secret,
        })
    }
}

/// The runtime knobs the server keeps after startup.
#[derive(Debug, Clone, Copy)]
pub struct ServerSettings {
    pub time_budget_secs: Option<u32>,
    pub hint_quota: u32,
    pub tick_interval: Duration,
    pub refresh_interval: Duration,
    pub leaderboard_size: usize,
}

impl ServerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            time_budget_secs: config.time_budget_secs,
            hint_quota: config.hint_quota,
            tick_interval: config.tick_interval,
            refresh_interval: config.refresh_interval,
            leaderboard_size: config.leaderboard_size,
        }
    }

    pub fn session_settings(&self, bank: &QuestionBank) -> SessionSettings {
        SessionSettings {
            time_budget_secs: self
                .time_budget_secs
                .unwrap_or_else(|| bank.time_budget_secs()),
            hint_quota: self.hint_quota,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            time_budget_secs: None,
            hint_quota: DEFAULT_HINT_QUOTA,
            tick_interval: Duration::from_secs(1),
            refresh_interval: Duration::from_secs(30),
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
        }
    }
}
