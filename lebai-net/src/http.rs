//! HTTP task client - task-management endpoint of the controller
//!
//! Implements [`TaskApi`] over the controller's public HTTP API:
//! GET  /public/task?id=N          → envelope of a task record
//! GET  /public/tasks?pi=N&ps=M    → envelope of a task page
//! POST /public/task               → envelope of `{ id }`
//! POST /public/executor/lua       → envelope of `{ id }`

use async_trait::async_trait;
use lebai_core::{
    ChannelConfig, ClientConfig, Error, GetTasksInput, Result, ResultEnvelope, RunRequest,
    RunTarget, TaskApi, TaskExecuteResult, TaskInfo, TasksResult,
};
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;

/// Task-management client bound to one controller
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: Client,
    base_url: String,
}

impl HttpTaskApi {
    pub fn new(base_url: impl Into<String>, channel: &ChannelConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(channel.connect_timeout())
            .timeout(channel.request_timeout())
            .build()
            .map_err(Error::transport)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(config.http_base_url(), &config.channel)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decode a response body as an envelope and unwrap it
    async fn decode<T>(response: Response, context: Option<&str>) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        let body = response.bytes().await.map_err(Error::transport)?;

        let envelope: ResultEnvelope<T> = match serde_json::from_slice(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => return Err(Error::Json(e)),
            Err(_) => {
                return Err(Error::transport(format!(
                    "HTTP {}: {}",
                    status,
                    String::from_utf8_lossy(&body)
                )))
            }
        };

        if !envelope.is_success() {
            tracing::warn!(code = envelope.code, context, "Controller rejected request");
        }
        Ok(envelope.into_result(context)?)
    }

    fn require<T>(data: Option<T>, operation: &'static str) -> Result<T> {
        data.ok_or(Error::MissingData { operation })
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn get_task(&self, id: i32) -> Result<TaskInfo> {
        let response = self
            .client
            .get(self.url(&format!("/public/task?id={}", id)))
            .send()
            .await
            .map_err(Error::transport)?;

        let context = format!("task id: {}", id);
        let task = Self::decode(response, Some(&context)).await?;
        Self::require(task, "get_task")
    }

    async fn get_tasks(&self, input: GetTasksInput) -> Result<TasksResult> {
        let response = self
            .client
            .get(self.url(&format!(
                "/public/tasks?pi={}&ps={}",
                input.page_index, input.page_size
            )))
            .send()
            .await
            .map_err(Error::transport)?;

        let page = Self::decode(response, None).await?;
        Self::require(page, "get_tasks")
    }

    async fn run(&self, request: RunRequest) -> Result<TaskExecuteResult> {
        tracing::debug!(url = %self.url("/public/task"), ?request, "Posting run request");

        let response = self
            .client
            .post(self.url("/public/task"))
            .json(&request)
            .send()
            .await
            .map_err(Error::transport)?;

        let context = match request.target {
            RunTarget::SceneId(id) => Some(format!("scene id: {}", id)),
            RunTarget::TaskId(_) => None,
        };
        let handle = Self::decode(response, context.as_deref()).await?;
        Self::require(handle, "run")
    }

    async fn execute_lua(&self, code: &str) -> Result<TaskExecuteResult> {
        let response = self
            .client
            .post(self.url("/public/executor/lua"))
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(code.to_string())
            .send()
            .await
            .map_err(Error::transport)?;

        let handle = Self::decode(response, None).await?;
        Self::require(handle, "execute_lua")
    }
}
