use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, SyncError};

pub const ENV_ENDPOINT: &str = "ENVSYNC_ENDPOINT";
pub const ENV_TOKEN: &str = "ENVSYNC_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "ENVSYNC_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// 远端存储客户端配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// GraphQL 端点，例如 `https://ledokku.example.com/graphql`
    pub endpoint: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// 从进程环境变量读取，存在 `.env` 时先加载。不做校验，见 [`ClientConfig::validate`]。
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("failed to load .env: {}", e);
            }
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 只从指定的 env 文件读取，不触碰进程环境
    pub fn from_env_file(path: &Path) -> Result<Self> {
        let iter = dotenvy::from_path_iter(path)
            .map_err(|e| SyncError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let mut vars = HashMap::new();
        for item in iter {
            let (k, v) = item.map_err(|e| SyncError::Config(e.to_string()))?;
            vars.insert(k, v);
        }
        Self::from_lookup(|name| vars.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let endpoint = lookup(ENV_ENDPOINT).unwrap_or_default();
        let token = lookup(ENV_TOKEN).filter(|t| !t.trim().is_empty());
        let timeout_secs = match lookup(ENV_TIMEOUT_SECS) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                SyncError::Config(format!(
                    "{} must be a positive integer, got {:?}",
                    ENV_TIMEOUT_SECS, raw
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        Ok(Self {
            endpoint: endpoint.trim().to_string(),
            token,
            timeout_secs,
        })
    }

    /// 命令行参数覆盖环境配置
    pub fn with_overrides(
        mut self,
        endpoint: Option<String>,
        token: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Self {
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint.trim().to_string();
        }
        if let Some(token) = token {
            self.token = Some(token);
        }
        if let Some(timeout_secs) = timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(SyncError::Config(format!(
                "no endpoint configured; set {} or pass --endpoint",
                ENV_ENDPOINT
            )));
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(SyncError::Config(format!(
                "endpoint must be an http(s) url: {}",
                self.endpoint
            )));
        }
        if self.timeout_secs == 0 {
            return Err(SyncError::Config("timeout must be greater than zero".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
