use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One logged work interval, owned by exactly one project for its entire
/// lifetime. `stopped_at` is absent while the interval is still open.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSession {
    pub id: String,
    pub project_id: String,
    pub started_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub invoiced: bool,
    pub created_at: DateTime<Utc>,
}
