//! Shared types
//!
//! Record shapes mirror the backend's wire format. Every collection the
//! dashboard holds is a full snapshot owned by the backend; the client never
//! mutates individual fields of a fetched record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Registered server as reported by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Server {
    /// Unique identifier
    pub hostname: String,
    pub ip: Option<String>,
    pub group: Option<String>,
    /// Free-form status string (online, offline, unknown, ...)
    #[serde(default)]
    pub status: String,
    /// Most recent liveness timestamp, displayed verbatim
    pub last_heartbeat: Option<String>,
    pub cpu_usage: Option<f64>,
    pub memory_usage: Option<f64>,
}

impl Server {
    /// CPU column text, empty when the metric is absent
    pub fn cpu_cell(&self) -> String {
        metric_cell(self.cpu_usage)
    }

    /// Memory column text, empty when the metric is absent
    pub fn memory_cell(&self) -> String {
        metric_cell(self.memory_usage)
    }
}

/// Numeric metric rendered for display; absent values render as empty cells,
/// never as a placeholder literal
fn metric_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Command target selector
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    /// A single host, addressed by hostname
    Node,
    /// Every host in a group
    Group,
    /// The whole fleet
    All,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Node => "node",
            TargetType::Group => "group",
            TargetType::All => "all",
        }
    }

    /// Cycle order used by the dispatch form selector
    pub fn next(self) -> Self {
        match self {
            TargetType::Node => TargetType::Group,
            TargetType::Group => TargetType::All,
            TargetType::All => TargetType::Node,
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dispatched command task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Unique identifier
    pub task_id: String,
    pub target_type: TargetType,
    pub target: Option<String>,
    pub command: String,
    /// Execution timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: i64,
    /// Remote user the command runs as
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub status: String,
    /// Creation timestamp, displayed verbatim
    pub created_at: String,
}

fn default_timeout() -> i64 {
    30
}

impl Task {
    /// Target column label: `all` for fleet-wide tasks, `<type>:<target>`
    /// otherwise (empty target renders as `<type>:`)
    pub fn target_label(&self) -> String {
        match self.target_type {
            TargetType::All => "all".to_string(),
            t => format!("{}:{}", t, self.target.as_deref().unwrap_or("")),
        }
    }
}

/// Opaque per-task result record; the shape is owned by the backend and the
/// dashboard displays it verbatim without further interpretation
pub type TaskResult = serde_json::Value;

/// Per-host public key record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientKey {
    /// PEM text; empty string means "no key set"
    pub public_key_pem: String,
}
