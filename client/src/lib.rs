//! HTTP resource client for the FleetDash backend
//!
//! Thin typed wrapper over the backend's JSON API. Every operation is a
//! single request/response pair with no retries and no cache; callers
//! decide recovery.

use fleetdash_core::{ClientKey, Error, Result, Server, TargetType, Task, TaskResult};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// New server registration payload
///
/// Absent optional fields serialize as explicit JSON `null`, matching what
/// the backend expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateServer {
    pub hostname: String,
    pub ip: Option<String>,
    pub group: Option<String>,
}

/// Command dispatch payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandRequest {
    pub target_type: TargetType,
    pub target: Option<String>,
    pub command: String,
    /// Execution timeout in seconds
    pub timeout: u64,
    pub user: Option<String>,
}

/// Error body shape the backend uses for non-success responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

#[derive(Debug, Serialize)]
struct SetClientKey<'a> {
    public_key_pem: &'a str,
}

/// Typed client for the backend HTTP API
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the given base origin (e.g. `http://localhost:8000`)
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Probe backend reachability
    pub async fn health(&self) -> Result<()> {
        let response = self.get(&self.url("/api/health")).await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// Fetch the full server collection
    pub async fn list_servers(&self) -> Result<Vec<Server>> {
        let response = self.get(&self.url("/api/servers")).await?;
        decode(ensure_success(response).await?).await
    }

    /// Fetch the full task collection
    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        let response = self.get(&self.url("/api/tasks")).await?;
        decode(ensure_success(response).await?).await
    }

    /// Fetch the collected results for one task
    pub async fn task_results(&self, task_id: &str) -> Result<Vec<TaskResult>> {
        let url = self.url(&format!("/api/tasks/{}/results", task_id));
        let response = self.get(&url).await?;
        decode(ensure_success(response).await?).await
    }

    /// Register a new server
    ///
    /// Hostname validity is the caller's responsibility; duplicates are
    /// detected by the backend (409), not here.
    pub async fn create_server(&self, server: &CreateServer) -> Result<()> {
        debug!(hostname = %server.hostname, "Registering server");
        let response = self
            .http
            .post(self.url("/api/servers"))
            .json(server)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        ensure_success(response).await?;
        Ok(())
    }

    /// Dispatch a command to the selected targets
    pub async fn submit_command(&self, command: &CommandRequest) -> Result<()> {
        debug!(target_type = %command.target_type, "Submitting command");
        let response = self
            .http
            .post(self.url("/api/commands"))
            .json(command)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        ensure_success(response).await?;
        Ok(())
    }

    /// Fetch the public key configured for a host; `Ok(None)` when the
    /// backend has no key record for it
    pub async fn client_key(&self, hostname: &str) -> Result<Option<ClientKey>> {
        let url = self.url(&format!("/api/client-keys/{}", hostname));
        let response = self.get(&url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let key = decode(ensure_success(response).await?).await?;
        Ok(Some(key))
    }

    /// Store a host's public key; an empty PEM clears the key
    pub async fn set_client_key(&self, hostname: &str, public_key_pem: &str) -> Result<()> {
        debug!(hostname = %hostname, "Saving client key");
        let url = self.url(&format!("/api/client-keys/{}", hostname));
        let response = self
            .http
            .put(&url)
            .json(&SetClientKey { public_key_pem })
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn get(&self, url: &str) -> Result<Response> {
        self.http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))
    }
}

/// Map a non-success status to `Error::Backend`, keeping the backend's
/// `{detail}` message when the body carries one
async fn ensure_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let detail = response.json::<ErrorBody>().await.ok().and_then(|b| b.detail);
    Err(Error::Backend { status, detail })
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| Error::Network(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.url("/api/servers"), "http://localhost:8000/api/servers");
    }

    #[test]
    fn test_create_server_wire_shape() {
        let payload = CreateServer {
            hostname: "node-1".to_string(),
            ip: Some("10.0.0.5".to_string()),
            group: None,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"hostname": "node-1", "ip": "10.0.0.5", "group": null})
        );
    }

    #[test]
    fn test_command_request_wire_shape() {
        let payload = CommandRequest {
            target_type: TargetType::All,
            target: None,
            command: "uptime".to_string(),
            timeout: 30,
            user: None,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "target_type": "all",
                "target": null,
                "command": "uptime",
                "timeout": 30,
                "user": null
            })
        );
    }

    #[test]
    fn test_results_path_binds_task_id() {
        let client = ApiClient::new("http://localhost:8000");
        assert_eq!(
            client.url(&format!("/api/tasks/{}/results", "abc123")),
            "http://localhost:8000/api/tasks/abc123/results"
        );
    }
}
