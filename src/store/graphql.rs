use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::RemoteStore;
use crate::config::ClientConfig;
use crate::error::{Result, SyncError};
use crate::models::{ConfigEntry, Resource};

const APP_BY_ID: &str = "query appById($appId: String!) { appById(appId: $appId) { id name } }";
const ENV_VARS: &str =
    "query envVars($appId: String!) { envVars(appId: $appId) { envVars { key value } } }";
const SET_ENV_VAR: &str = concat!(
    "mutation setEnvVar($key: String!, $value: String!, $appId: String!) { ",
    "setEnvVar(input: { key: $key, value: $value, appId: $appId }) { result } }",
);
const UNSET_ENV_VAR: &str = concat!(
    "mutation unsetEnvVar($key: String!, $appId: String!) { ",
    "unsetEnvVar(input: { key: $key, appId: $appId }) { result } }",
);

#[derive(Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppByIdData {
    app_by_id: Option<Resource>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvVarsData {
    env_vars: EnvVarList,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvVarList {
    env_vars: Vec<ConfigEntry>,
}

/// 写操作只关心成功与否
#[derive(Deserialize)]
struct Ignored {}

/// 通过 GraphQL over HTTP 访问远端存储
pub struct GraphqlStore {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl GraphqlStore {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
        })
    }

    /// 发送一次 GraphQL 请求。`errors` 中的第一条消息原样作为失败消息。
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T> {
        tracing::debug!(operation, endpoint = %self.endpoint, "graphql request");
        let body = json!({
            "operationName": operation,
            "query": query,
            "variables": variables,
        });
        // 所有请求都绕过中间缓存
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let parsed: GraphqlResponse<T> = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(SyncError::Transport(format!("{} returned {}", operation, status)));
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(err) = parsed.errors.into_iter().next() {
            return Err(SyncError::Rejected(err.message));
        }
        if !status.is_success() {
            return Err(SyncError::Transport(format!("{} returned {}", operation, status)));
        }
        parsed
            .data
            .ok_or_else(|| SyncError::Transport(format!("{} response carried no data", operation)))
    }
}

#[async_trait]
impl RemoteStore for GraphqlStore {
    async fn get_resource(&self, resource_id: &str) -> Result<Option<Resource>> {
        let data: AppByIdData = self
            .execute("appById", APP_BY_ID, json!({ "appId": resource_id }))
            .await?;
        Ok(data.app_by_id)
    }

    async fn list_entries(&self, resource_id: &str) -> Result<Vec<ConfigEntry>> {
        let data: EnvVarsData = self
            .execute("envVars", ENV_VARS, json!({ "appId": resource_id }))
            .await?;
        Ok(data.env_vars.env_vars)
    }

    async fn set_entry(&self, resource_id: &str, key: &str, value: &str) -> Result<()> {
        let _: Ignored = self
            .execute(
                "setEnvVar",
                SET_ENV_VAR,
                json!({ "appId": resource_id, "key": key, "value": value }),
            )
            .await?;
        Ok(())
    }

    async fn unset_entry(&self, resource_id: &str, key: &str) -> Result<()> {
        let _: Ignored = self
            .execute(
                "unsetEnvVar",
                UNSET_ENV_VAR,
                json!({ "appId": resource_id, "key": key }),
            )
            .await?;
        Ok(())
    }
}
