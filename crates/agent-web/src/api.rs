//! API Client

use serde::{Deserialize, Serialize};

/// Chat message as recorded in the session history
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCatalogs {
    pub calculator: Vec<ToolSummary>,
    pub weather: Vec<ToolSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Readiness {
    Uninitialized,
    Initializing,
    Ready,
    Failed { provider: String, reason: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: String,
    pub status: Readiness,
    pub status_message: String,
    pub history: Vec<ChatMessage>,
    pub tools: ToolCatalogs,
    pub calculator_ready: bool,
    pub weather_ready: bool,
    pub message_count: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MessageReply {
    pub reply: String,
    pub agent: String,
    pub outcome: String,
    pub session: SessionSnapshot,
}

/// Absolute URL for a server path (reqwest needs a base in the browser)
fn url(path: &str) -> String {
    let origin = web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_else(|| "http://localhost:8000".into());
    format!("{origin}{path}")
}

/// Run the requirements gateway
pub async fn run_requirements(user_input: &str, agent_type: &str) -> Result<String, String> {
    let body = serde_json::json!({
        "user_input": user_input,
        "agent_type": agent_type,
    });

    let response = reqwest::Client::new()
        .post(url("/run"))
        .json(&body)
        .send()
        .await
        .map_err(|e| format!("Request failed: {e}"))?;

    if response.status().is_success() {
        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| format!("Request failed: {e}"))?;
        Ok(data["result"].as_str().unwrap_or_default().to_string())
    } else {
        Err(format!("API Error: {}", response.status().as_u16()))
    }
}

async fn session_request(
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, String> {
    let response = request.send().await.map_err(|e| e.to_string())?;
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status().as_u16();
        let data: serde_json::Value = response.json().await.unwrap_or_default();
        Err(data["error"]
            .as_str()
            .map_or_else(|| format!("API Error: {status}"), ToString::to_string))
    }
}

async fn snapshot(request: reqwest::RequestBuilder) -> Result<SessionSnapshot, String> {
    session_request(request)
        .await?
        .json()
        .await
        .map_err(|e| e.to_string())
}

/// Start a chat session; the server initializes its agents before replying
pub async fn create_session() -> Result<SessionSnapshot, String> {
    snapshot(reqwest::Client::new().post(url("/api/sessions"))).await
}

pub async fn send_message(id: &str, message: &str, mode: &str) -> Result<MessageReply, String> {
    let body = serde_json::json!({ "message": message, "mode": mode });
    session_request(
        reqwest::Client::new()
            .post(url(&format!("/api/sessions/{id}/messages")))
            .json(&body),
    )
    .await?
    .json()
    .await
    .map_err(|e| e.to_string())
}

pub async fn reinitialize(id: &str) -> Result<SessionSnapshot, String> {
    snapshot(reqwest::Client::new().post(url(&format!("/api/sessions/{id}/reinitialize")))).await
}

pub async fn clear_chat(id: &str) -> Result<SessionSnapshot, String> {
    snapshot(reqwest::Client::new().post(url(&format!("/api/sessions/{id}/clear")))).await
}

pub async fn close_session(id: &str) -> Result<(), String> {
    session_request(reqwest::Client::new().delete(url(&format!("/api/sessions/{id}"))))
        .await
        .map(|_| ())
}

/// Close a session while the page is going away.
///
/// Nothing can be awaited during `pagehide`; a keepalive fetch is allowed to
/// outlive the document.
pub fn close_session_on_unload(id: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let init = web_sys::RequestInit::new();
    init.set_method("DELETE");
    init.set_keepalive(true);
    let _ = window.fetch_with_str_and_init(&url(&format!("/api/sessions/{id}")), &init);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_ignores_server_only_fields() {
        let snapshot: SessionSnapshot = serde_json::from_value(serde_json::json!({
            "id": "abc",
            "status": {"state": "failed", "provider": "weather", "reason": "Timeout connecting to weather server. Make sure it's running on http://localhost:8002/mcp"},
            "status_message": "Timeout connecting to weather server. Make sure it's running on http://localhost:8002/mcp",
            "history": [{"role": "user", "content": "hi", "timestamp": "2024-01-01T00:00:00Z", "tool_call_id": null}],
            "tools": {"calculator": [], "weather": []},
            "calculator_ready": false,
            "weather_ready": false,
            "message_count": 1,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert!(matches!(snapshot.status, Readiness::Failed { ref provider, .. } if provider == "weather"));
        assert_eq!(snapshot.history[0].content, "hi");
    }
}
