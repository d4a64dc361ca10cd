use tauri::State;

use crate::{
    db::{InvoiceSummary, Project, ProjectDataset, ProjectUpdate, ProjectView},
    projects::{ProjectViewModel, TrackerState},
    AppState,
};

fn view_model_from_state(state: &State<'_, AppState>) -> ProjectViewModel {
    state.projects.clone()
}

#[tauri::command]
pub async fn bind_projects(state: State<'_, AppState>) -> Result<ProjectDataset, String> {
    let view_model = view_model_from_state(&state);
    view_model.bind().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn unbind_projects(state: State<'_, AppState>) -> Result<(), String> {
    let view_model = view_model_from_state(&state);
    view_model.unbind();
    Ok(())
}

#[tauri::command]
pub async fn get_project_dataset(state: State<'_, AppState>) -> Result<ProjectDataset, String> {
    let view_model = view_model_from_state(&state);
    view_model.dataset().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn add_project(state: State<'_, AppState>, name: String) -> Result<(), String> {
    let view_model = view_model_from_state(&state);
    view_model.add_project(&name).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn delete_project(state: State<'_, AppState>, project_id: String) -> Result<(), String> {
    let view_model = view_model_from_state(&state);
    view_model
        .delete_project(&project_id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn update_project(
    state: State<'_, AppState>,
    project_id: String,
    update: ProjectUpdate,
) -> Result<(), String> {
    let view_model = view_model_from_state(&state);
    view_model
        .update_project(&project_id, update)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn invoice_project(
    state: State<'_, AppState>,
    project_id: String,
) -> Result<InvoiceSummary, String> {
    let view_model = view_model_from_state(&state);
    view_model
        .invoice_project(&project_id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_invoice_preview(
    state: State<'_, AppState>,
    project_id: String,
) -> Result<InvoiceSummary, String> {
    let view_model = view_model_from_state(&state);
    view_model
        .invoice_preview(&project_id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn search_projects(
    state: State<'_, AppState>,
    query: String,
) -> Result<Vec<ProjectView>, String> {
    let view_model = view_model_from_state(&state);
    view_model
        .search_projects(&query)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn list_archived_projects(
    state: State<'_, AppState>,
) -> Result<Vec<ProjectView>, String> {
    let view_model = view_model_from_state(&state);
    view_model.archived_projects().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_project_details(
    state: State<'_, AppState>,
    project_id: String,
) -> Result<Project, String> {
    let view_model = view_model_from_state(&state);
    view_model
        .project_details(&project_id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn start_progress(
    state: State<'_, AppState>,
    project_id: String,
) -> Result<TrackerState, String> {
    let view_model = view_model_from_state(&state);
    view_model
        .start_progress(&project_id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn stop_progress(state: State<'_, AppState>) -> Result<TrackerState, String> {
    let view_model = view_model_from_state(&state);
    Ok(view_model.stop_progress().await)
}

#[tauri::command]
pub async fn get_progress_state(state: State<'_, AppState>) -> Result<TrackerState, String> {
    let view_model = view_model_from_state(&state);
    Ok(view_model.progress_state().await)
}

#[tauri::command]
pub async fn get_time_spent(
    state: State<'_, AppState>,
    project_id: String,
) -> Result<f64, String> {
    let view_model = view_model_from_state(&state);
    view_model
        .time_spent(&project_id)
        .await
        .map_err(|e| e.to_string())
}
