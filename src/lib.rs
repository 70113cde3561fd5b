mod application;
mod domain;
mod infrastructure;

use application::bootstrap::bootstrap_workspace;
use application::commands::{
    AppState, RegisterResponse, SelectionResponse, StatsResponse, TimerStateResponse,
    add_subtask_impl, create_task_impl, current_user_impl, delete_subtask_impl, delete_task_impl,
    enhance_task_via_api_impl, get_settings_impl, get_stats_impl, get_timer_impl, list_tasks_impl,
    login_impl, logout_impl, pause_timer_impl, register_impl, reset_timer_impl, start_timer_impl,
    switch_timer_mode_impl, toggle_subtask_impl, toggle_task_impl, update_settings_impl,
    update_task_title_impl,
};
use domain::models::{Settings, Task, User};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct BootstrapResponse {
    workspace_root: String,
    database_path: String,
}

#[tauri::command]
fn bootstrap(root: Option<String>) -> Result<BootstrapResponse, String> {
    let workspace_root = match root {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir().map_err(|error| error.to_string())?,
    };

    let result = bootstrap_workspace(&workspace_root).map_err(|error| error.to_string())?;
    Ok(BootstrapResponse {
        workspace_root: result.workspace_root.display().to_string(),
        database_path: result.database_path.display().to_string(),
    })
}

#[tauri::command]
fn ping() -> &'static str {
    "pong"
}

#[tauri::command]
fn list_tasks(
    state: tauri::State<'_, AppState>,
    view: String,
    filter: String,
    category: Option<String>,
) -> Result<SelectionResponse, String> {
    list_tasks_impl(state.inner(), view, filter, category)
        .map_err(|error| state.command_error("list_tasks", &error))
}

#[tauri::command]
fn create_task(
    state: tauri::State<'_, AppState>,
    title: String,
    due_date: Option<String>,
) -> Result<Option<Task>, String> {
    create_task_impl(state.inner(), title, due_date)
        .map_err(|error| state.command_error("create_task", &error))
}

#[tauri::command]
fn toggle_task(state: tauri::State<'_, AppState>, task_id: String) -> Result<Option<Task>, String> {
    toggle_task_impl(state.inner(), task_id)
        .map_err(|error| state.command_error("toggle_task", &error))
}

#[tauri::command]
fn update_task_title(
    state: tauri::State<'_, AppState>,
    task_id: String,
    title: String,
) -> Result<Option<Task>, String> {
    update_task_title_impl(state.inner(), task_id, title)
        .map_err(|error| state.command_error("update_task_title", &error))
}

#[tauri::command]
fn delete_task(state: tauri::State<'_, AppState>, task_id: String) -> Result<bool, String> {
    delete_task_impl(state.inner(), task_id)
        .map_err(|error| state.command_error("delete_task", &error))
}

#[tauri::command]
fn add_subtask(
    state: tauri::State<'_, AppState>,
    task_id: String,
    title: String,
) -> Result<Option<Task>, String> {
    add_subtask_impl(state.inner(), task_id, title)
        .map_err(|error| state.command_error("add_subtask", &error))
}

#[tauri::command]
fn toggle_subtask(
    state: tauri::State<'_, AppState>,
    task_id: String,
    subtask_id: String,
) -> Result<Option<Task>, String> {
    toggle_subtask_impl(state.inner(), task_id, subtask_id)
        .map_err(|error| state.command_error("toggle_subtask", &error))
}

#[tauri::command]
fn delete_subtask(
    state: tauri::State<'_, AppState>,
    task_id: String,
    subtask_id: String,
) -> Result<Option<Task>, String> {
    delete_subtask_impl(state.inner(), task_id, subtask_id)
        .map_err(|error| state.command_error("delete_subtask", &error))
}

#[tauri::command]
fn get_stats(state: tauri::State<'_, AppState>) -> Result<StatsResponse, String> {
    get_stats_impl(state.inner()).map_err(|error| state.command_error("get_stats", &error))
}

#[tauri::command]
async fn enhance_task(
    state: tauri::State<'_, AppState>,
    task_id: String,
) -> Result<Option<Task>, String> {
    enhance_task_via_api_impl(state.inner(), task_id)
        .await
        .map_err(|error| state.command_error("enhance_task", &error))
}

#[tauri::command]
fn start_timer(state: tauri::State<'_, AppState>) -> Result<TimerStateResponse, String> {
    start_timer_impl(state.inner()).map_err(|error| state.command_error("start_timer", &error))
}

#[tauri::command]
fn pause_timer(state: tauri::State<'_, AppState>) -> Result<TimerStateResponse, String> {
    pause_timer_impl(state.inner()).map_err(|error| state.command_error("pause_timer", &error))
}

#[tauri::command]
fn reset_timer(state: tauri::State<'_, AppState>) -> Result<TimerStateResponse, String> {
    reset_timer_impl(state.inner()).map_err(|error| state.command_error("reset_timer", &error))
}

#[tauri::command]
fn switch_timer_mode(
    state: tauri::State<'_, AppState>,
    mode: String,
) -> Result<TimerStateResponse, String> {
    switch_timer_mode_impl(state.inner(), mode)
        .map_err(|error| state.command_error("switch_timer_mode", &error))
}

#[tauri::command]
fn get_timer(state: tauri::State<'_, AppState>) -> Result<TimerStateResponse, String> {
    get_timer_impl(state.inner()).map_err(|error| state.command_error("get_timer", &error))
}

#[tauri::command]
fn get_settings(state: tauri::State<'_, AppState>) -> Result<Settings, String> {
    get_settings_impl(state.inner()).map_err(|error| state.command_error("get_settings", &error))
}

#[tauri::command]
fn update_settings(
    state: tauri::State<'_, AppState>,
    sound_enabled: bool,
    notifications_enabled: bool,
) -> Result<Settings, String> {
    update_settings_impl(state.inner(), sound_enabled, notifications_enabled)
        .map_err(|error| state.command_error("update_settings", &error))
}

#[tauri::command]
fn login(
    state: tauri::State<'_, AppState>,
    email: String,
    password: String,
) -> Result<Option<User>, String> {
    login_impl(state.inner(), email, password)
        .map_err(|error| state.command_error("login", &error))
}

#[tauri::command]
fn register(
    state: tauri::State<'_, AppState>,
    name: String,
    email: String,
    password: String,
) -> Result<RegisterResponse, String> {
    register_impl(state.inner(), name, email, password)
        .map_err(|error| state.command_error("register", &error))
}

#[tauri::command]
fn logout(state: tauri::State<'_, AppState>) -> Result<(), String> {
    logout_impl(state.inner()).map_err(|error| state.command_error("logout", &error))
}

#[tauri::command]
fn get_current_user(state: tauri::State<'_, AppState>) -> Result<Option<User>, String> {
    current_user_impl(state.inner())
        .map_err(|error| state.command_error("get_current_user", &error))
}

pub fn run() {
    let workspace_root = std::env::current_dir().expect("failed to resolve current directory");
    let app_state = AppState::new(workspace_root).expect("failed to initialize app state");

    tauri::Builder::default()
        .manage(app_state)
        .invoke_handler(tauri::generate_handler![
            ping,
            bootstrap,
            list_tasks,
            create_task,
            toggle_task,
            update_task_title,
            delete_task,
            add_subtask,
            toggle_subtask,
            delete_subtask,
            get_stats,
            enhance_task,
            start_timer,
            pause_timer,
            reset_timer,
            switch_timer_mode,
            get_timer,
            get_settings,
            update_settings,
            login,
            register,
            logout,
            get_current_user
        ])
        .run(tauri::generate_context!())
        .expect("failed to run tauri app");
}
