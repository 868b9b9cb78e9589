// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Moneysync", "moneysync"));

pub const DEFAULT_BASE_URL: &str = "https://shmr-finance.ru/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub token: String,
    pub request_timeout: Duration,
    pub data_dir: PathBuf,
}

pub fn default_data_dir() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    Ok(proj.data_dir().to_path_buf())
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: String::new(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            data_dir: data_dir.into(),
        }
    }

    /// Defaults overlaid with `MONEYSYNC_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let data_dir = match env::var("MONEYSYNC_DATA_DIR") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_data_dir()?,
        };
        let mut cfg = Config::new(data_dir);
        if let Ok(url) = env::var("MONEYSYNC_BASE_URL") {
            cfg.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(token) = env::var("MONEYSYNC_TOKEN") {
            cfg.token = token;
        }
        if let Ok(raw) = env::var("MONEYSYNC_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid MONEYSYNC_TIMEOUT_SECS '{}'", raw))?;
            anyhow::ensure!(secs > 0, "MONEYSYNC_TIMEOUT_SECS must be positive");
            cfg.request_timeout = Duration::from_secs(secs);
        }
        Ok(cfg)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn transactions_path(&self) -> PathBuf {
        self.data_dir.join("transactions.json")
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("moneysync.sqlite")
    }
}
