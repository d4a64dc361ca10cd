//! Project-related data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::WorkSession;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub sessions: Vec<WorkSession>,
}

/// Fields the detail screen can change on save. The record is replaced as a
/// whole; `name` must stay non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    pub name: String,
    pub description: Option<String>,
    pub completed: bool,
}

/// Row shape published to the list screens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub id: String,
    pub name: String,
    pub time_spent_display: String,
    pub completed: bool,
}

/// The partitioned dataset consumed by the list screen. `completed` is
/// `None` when no completed projects exist, which renders as no section at
/// all rather than an empty one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDataset {
    pub in_progress: Vec<ProjectView>,
    pub completed: Option<Vec<ProjectView>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummary {
    pub project_id: String,
    pub project_name: String,
    pub hours: f64,
    pub amount: f64,
    pub currency: String,
}
