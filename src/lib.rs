mod db;
mod projects;
mod settings;
mod utils;

use std::sync::Arc;

use db::Database;
use projects::{
    commands::{
        add_project, bind_projects, delete_project, get_invoice_preview, get_progress_state,
        get_project_dataset, get_project_details, get_time_spent, invoice_project,
        list_archived_projects, search_projects, start_progress, stop_progress, unbind_projects,
        update_project,
    },
    ProjectViewModel,
};
use settings::{InvoiceSettings, SettingsStore};
use tauri::{Emitter, Manager, State};

pub(crate) struct AppState {
    pub(crate) projects: ProjectViewModel,
    pub(crate) settings: Arc<SettingsStore>,
}

#[tauri::command]
fn get_invoice_settings(state: State<AppState>) -> Result<InvoiceSettings, String> {
    Ok(state.settings.invoice())
}

#[tauri::command]
fn set_invoice_settings(
    settings: InvoiceSettings,
    state: State<AppState>,
    app_handle: tauri::AppHandle,
) -> Result<(), String> {
    state
        .settings
        .update_invoice(settings.clone())
        .map_err(|e| e.to_string())?;

    app_handle
        .emit("invoice-settings-updated", &settings)
        .map_err(|e| e.to_string())?;

    Ok(())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Freelancer starting up...");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let db_path = app_data_dir.join("freelancer.sqlite3");
                let database = Database::new(db_path)?;

                let settings_path = app_data_dir.join("settings.json");
                let settings = Arc::new(SettingsStore::new(settings_path)?);

                let view_model =
                    ProjectViewModel::new(app.handle().clone(), database, settings.clone());

                app.manage(AppState {
                    projects: view_model,
                    settings,
                });

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            bind_projects,
            unbind_projects,
            get_project_dataset,
            add_project,
            delete_project,
            update_project,
            invoice_project,
            get_invoice_preview,
            search_projects,
            list_archived_projects,
            get_project_details,
            start_progress,
            stop_progress,
            get_progress_state,
            get_time_spent,
            get_invoice_settings,
            set_invoice_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
