use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::{DateTime, Utc};
use log::{error, info};
use tauri::{AppHandle, Emitter};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    db::{
        Database, InvoiceSummary, Project, ProjectDataset, ProjectUpdate, ProjectView, WorkSession,
    },
    log_info,
    projects::{aggregate, ProjectError, TrackerState},
    settings::{InvoiceSettings, SettingsStore},
};

const ENABLE_LOGS: bool = false;

/// Orchestrates the project screens: while bound it republishes the full
/// partitioned dataset after every mutation; while unbound the store can
/// change without anything being emitted. There is no incremental update
/// path, every mutation triggers a recompute over the whole record set.
#[derive(Clone)]
pub struct ProjectViewModel {
    db: Database,
    settings: Arc<SettingsStore>,
    app_handle: AppHandle,
    bound: Arc<AtomicBool>,
    tracker: Arc<Mutex<TrackerState>>,
}

impl ProjectViewModel {
    pub fn new(app_handle: AppHandle, db: Database, settings: Arc<SettingsStore>) -> Self {
        Self {
            db,
            settings,
            app_handle,
            bound: Arc::new(AtomicBool::new(false)),
            tracker: Arc::new(Mutex::new(TrackerState::new())),
        }
    }

    /// Enter the bound state and publish the current dataset immediately.
    pub async fn bind(&self) -> Result<ProjectDataset, ProjectError> {
        self.bound.store(true, Ordering::SeqCst);
        let dataset = self.dataset().await?;
        emit_dataset(&self.app_handle, dataset.clone());
        Ok(dataset)
    }

    /// Leave the bound state. Later store changes no longer publish.
    pub fn unbind(&self) {
        self.bound.store(false, Ordering::SeqCst);
    }

    /// Partitioned snapshot of the whole record set, with the tracked
    /// project's unpersisted live time folded into its display row.
    pub async fn dataset(&self) -> Result<ProjectDataset, ProjectError> {
        let live = self.live_snapshot().await;
        let projects = self.db.list_projects().await?;
        Ok(aggregate::dataset(
            projects,
            live.as_ref().map(|(id, ms)| (id.as_str(), *ms)),
        ))
    }

    pub async fn add_project(&self, name: &str) -> Result<(), ProjectError> {
        match create_project(&self.db, name).await {
            Ok(project) => {
                info!("Created project {} ({})", project.name, project.id);
                self.refresh().await;
                Ok(())
            }
            Err(ProjectError::Storage(err)) => {
                error!("Failed to save project: {err:#}");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<(), ProjectError> {
        if let Err(err) = self.db.delete_project(project_id).await {
            error!("Failed to delete project {project_id}: {err:#}");
            return Ok(());
        }

        self.refresh().await;
        Ok(())
    }

    /// Save flow of the detail screen. Any pending tracked duration for
    /// this project is drained (a still running interval is force-stopped
    /// first) and appended as a real session alongside the field update.
    pub async fn update_project(
        &self,
        project_id: &str,
        update: ProjectUpdate,
    ) -> Result<(), ProjectError> {
        let pending_ms = {
            let mut tracker = self.tracker.lock().await;
            tracker.finalize_for(project_id, Utc::now())
        };

        match apply_update(&self.db, project_id, update, pending_ms, Utc::now()).await {
            Ok(_) => {
                self.refresh().await;
                Ok(())
            }
            Err(ProjectError::Storage(err)) => {
                error!("Failed to update project {project_id}: {err:#}");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub async fn invoice_project(&self, project_id: &str) -> Result<InvoiceSummary, ProjectError> {
        let settings = self.settings.invoice();
        let summary = perform_invoice(&self.db, project_id, &settings).await?;

        info!(
            "Invoiced project {} for {:.2} {}",
            summary.project_name, summary.amount, summary.currency
        );
        if let Err(err) = self.app_handle.emit("project-invoiced", summary.clone()) {
            error!("Failed to emit project-invoiced: {err}");
        }

        self.refresh().await;
        Ok(summary)
    }

    /// The amount an invoice would carry right now, without writing
    /// anything. The list screen uses this for its confirmation dialog.
    pub async fn invoice_preview(&self, project_id: &str) -> Result<InvoiceSummary, ProjectError> {
        let settings = self.settings.invoice();
        let project = require_project(&self.db, project_id).await?;
        summary_for(&project, &settings)
    }

    /// The store matches the name substring; the engine keeps completed
    /// projects out of the results no matter how well they match.
    pub async fn search_projects(&self, query: &str) -> Result<Vec<ProjectView>, ProjectError> {
        let matches = self.db.search_projects_by_name(query).await?;
        let matches = aggregate::search(&matches, query);
        log_info!("Search \"{query}\" matched {} projects", matches.len());

        let live = self.live_snapshot().await;
        Ok(matches
            .iter()
            .map(|project| {
                let live_ms = match &live {
                    Some((id, ms)) if *id == project.id => Some(*ms),
                    _ => None,
                };
                aggregate::project_view(project, live_ms)
            })
            .collect())
    }

    /// Completed projects, for the archive screen.
    pub async fn archived_projects(&self) -> Result<Vec<ProjectView>, ProjectError> {
        let projects = self.db.list_projects().await?;
        let (_, completed) = aggregate::partition(projects);
        Ok(completed
            .iter()
            .map(|project| aggregate::project_view(project, None))
            .collect())
    }

    pub async fn project_details(&self, project_id: &str) -> Result<Project, ProjectError> {
        require_project(&self.db, project_id).await
    }

    pub async fn start_progress(&self, project_id: &str) -> Result<TrackerState, ProjectError> {
        let project = require_project(&self.db, project_id).await?;

        let mut tracker = self.tracker.lock().await;
        tracker.start(project.id, Utc::now());
        Ok(tracker.clone())
    }

    pub async fn stop_progress(&self) -> TrackerState {
        let mut tracker = self.tracker.lock().await;
        tracker.stop(Utc::now());
        tracker.clone()
    }

    pub async fn progress_state(&self) -> TrackerState {
        self.tracker.lock().await.clone()
    }

    /// Hours spent on a project including the live tracked interval.
    pub async fn time_spent(&self, project_id: &str) -> Result<f64, ProjectError> {
        let project = require_project(&self.db, project_id).await?;
        let live = {
            let tracker = self.tracker.lock().await;
            tracker.live_for(project_id, Utc::now())
        };
        Ok(aggregate::time_spent_hours(&project, live))
    }

    async fn live_snapshot(&self) -> Option<(String, u64)> {
        let tracker = self.tracker.lock().await;
        let project_id = tracker.project_id.clone()?;
        let live_ms = tracker.live_for(&project_id, Utc::now()).unwrap_or(0);
        Some((project_id, live_ms))
    }

    async fn refresh(&self) {
        if !self.bound.load(Ordering::SeqCst) {
            return;
        }

        match self.dataset().await {
            Ok(dataset) => {
                log_info!(
                    "Publishing dataset: {} in progress, {} completed",
                    dataset.in_progress.len(),
                    dataset.completed.as_ref().map_or(0, Vec::len)
                );
                emit_dataset(&self.app_handle, dataset);
            }
            Err(err) => error!("Failed to recompute project dataset: {err}"),
        }
    }
}

fn emit_dataset(app_handle: &AppHandle, dataset: ProjectDataset) {
    let _ = app_handle.emit("projects-updated", dataset);
}

async fn require_project(db: &Database, project_id: &str) -> Result<Project, ProjectError> {
    db.get_project(project_id)
        .await?
        .ok_or_else(|| ProjectError::NotFound(project_id.to_string()))
}

/// Create a project with only a name. Duplicates are rejected before any
/// write so the store's record count is untouched.
async fn create_project(db: &Database, name: &str) -> Result<Project, ProjectError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ProjectError::EmptyName);
    }
    if db.project_exists(name).await? {
        return Err(ProjectError::DuplicateName(name.to_string()));
    }

    let now = Utc::now();
    let project = Project {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        description: None,
        completed: false,
        created_at: now,
        updated_at: now,
        sessions: Vec::new(),
    };
    db.insert_project(&project).await?;
    Ok(project)
}

async fn apply_update(
    db: &Database,
    project_id: &str,
    update: ProjectUpdate,
    pending_ms: u64,
    now: DateTime<Utc>,
) -> Result<Project, ProjectError> {
    let mut project = require_project(db, project_id).await?;

    let name = update.name.trim();
    if name.is_empty() {
        return Err(ProjectError::EmptyName);
    }
    if name != project.name && db.project_exists(name).await? {
        return Err(ProjectError::DuplicateName(name.to_string()));
    }

    project.name = name.to_string();
    project.description = update.description;
    project.completed = update.completed;
    project.updated_at = now;
    db.update_project(&project).await?;

    if pending_ms > 0 {
        let session = WorkSession {
            id: Uuid::new_v4().to_string(),
            project_id: project.id.clone(),
            started_at: now - chrono::Duration::milliseconds(pending_ms as i64),
            stopped_at: Some(now),
            invoiced: false,
            created_at: now,
        };
        db.insert_work_session(&session).await?;
        project.sessions.push(session);
    }

    Ok(project)
}

fn summary_for(
    project: &Project,
    settings: &InvoiceSettings,
) -> Result<InvoiceSummary, ProjectError> {
    let amount = aggregate::invoiced_amount(project, settings.hourly_rate)?;
    Ok(InvoiceSummary {
        project_id: project.id.clone(),
        project_name: project.name.clone(),
        hours: aggregate::uninvoiced_hours(project),
        amount,
        currency: settings.currency.clone(),
    })
}

async fn perform_invoice(
    db: &Database,
    project_id: &str,
    settings: &InvoiceSettings,
) -> Result<InvoiceSummary, ProjectError> {
    let project = require_project(db, project_id).await?;
    let summary = summary_for(&project, settings)?;
    db.mark_sessions_invoiced(&project.id).await?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    use super::{apply_update, create_project, perform_invoice};
    use crate::{
        db::{Database, ProjectUpdate},
        projects::{aggregate, ProjectError},
        settings::InvoiceSettings,
    };

    fn open_db() -> (Database, TempDir) {
        let dir = TempDir::new().expect("tempdir");
        let db = Database::new(dir.path().join("test.sqlite3")).expect("open database");
        (db, dir)
    }

    fn settings(rate: f64) -> InvoiceSettings {
        InvoiceSettings {
            hourly_rate: rate,
            currency: "dkk".to_string(),
        }
    }

    fn update_for(name: &str, completed: bool) -> ProjectUpdate {
        ProjectUpdate {
            name: name.to_string(),
            description: None,
            completed,
        }
    }

    #[tokio::test]
    async fn created_project_starts_clean() {
        let (db, _dir) = open_db();

        let project = create_project(&db, "Python").await.unwrap();

        assert!(!project.completed);
        assert!(project.sessions.is_empty());
        assert_eq!(aggregate::time_spent_ms(&project, None), 0);
        assert_eq!(db.list_projects().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected_and_store_untouched() {
        let (db, _dir) = open_db();
        create_project(&db, "Alpha").await.unwrap();

        let err = create_project(&db, "Alpha").await.unwrap_err();

        assert!(matches!(err, ProjectError::DuplicateName(name) if name == "Alpha"));
        assert_eq!(db.list_projects().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let (db, _dir) = open_db();
        assert!(matches!(
            create_project(&db, "   ").await,
            Err(ProjectError::EmptyName)
        ));
    }

    #[tokio::test]
    async fn saving_with_pending_time_appends_a_session() {
        let (db, _dir) = open_db();
        let project = create_project(&db, "Swift").await.unwrap();

        let two_hours = 2 * 60 * 60 * 1000;
        apply_update(
            &db,
            &project.id,
            update_for("Swift", false),
            two_hours,
            Utc::now(),
        )
        .await
        .unwrap();

        let fetched = db.get_project(&project.id).await.unwrap().unwrap();
        assert_eq!(fetched.sessions.len(), 1);
        assert_eq!(aggregate::time_spent_hours(&fetched, None), 2.0);
    }

    #[tokio::test]
    async fn completing_a_project_moves_it_out_of_search_and_partition() {
        let (db, _dir) = open_db();
        let project = create_project(&db, "Swift").await.unwrap();
        create_project(&db, "Python").await.unwrap();

        apply_update(
            &db,
            &project.id,
            update_for("Swift", true),
            0,
            Utc::now(),
        )
        .await
        .unwrap();

        let (in_progress, completed) = aggregate::partition(db.list_projects().await.unwrap());
        assert_eq!(in_progress.len(), 1);
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].name, "Swift");

        let matches = db.search_projects_by_name("Swift").await.unwrap();
        assert!(aggregate::search(&matches, "Swift").is_empty());
    }

    #[tokio::test]
    async fn renaming_onto_an_existing_project_is_rejected() {
        let (db, _dir) = open_db();
        create_project(&db, "Alpha").await.unwrap();
        let beta = create_project(&db, "Beta").await.unwrap();

        let err = apply_update(&db, &beta.id, update_for("Alpha", false), 0, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ProjectError::DuplicateName(_)));
    }

    #[tokio::test]
    async fn updating_a_missing_project_reports_not_found() {
        let (db, _dir) = open_db();
        let err = apply_update(&db, "ghost", update_for("Ghost", false), 0, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ProjectError::NotFound(_)));
    }

    #[tokio::test]
    async fn invoicing_without_logged_time_is_rejected() {
        let (db, _dir) = open_db();
        let project = create_project(&db, "Swift").await.unwrap();

        let err = perform_invoice(&db, &project.id, &settings(500.0))
            .await
            .unwrap_err();
        assert!(matches!(err, ProjectError::NothingToInvoice));
    }

    #[tokio::test]
    async fn invoicing_bills_uninvoiced_hours_once() {
        let (db, _dir) = open_db();
        let project = create_project(&db, "Swift").await.unwrap();

        let five_hours = 5 * 60 * 60 * 1000;
        apply_update(
            &db,
            &project.id,
            update_for("Swift", false),
            five_hours,
            Utc::now() - Duration::days(1),
        )
        .await
        .unwrap();

        let summary = perform_invoice(&db, &project.id, &settings(500.0))
            .await
            .unwrap();
        assert_eq!(summary.hours, 5.0);
        assert_eq!(summary.amount, 2500.0);

        let err = perform_invoice(&db, &project.id, &settings(500.0))
            .await
            .unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyInvoiced));
    }
}
