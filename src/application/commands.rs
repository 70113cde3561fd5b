use crate::application::auth::{AuthService, EMAIL_TAKEN_MESSAGE, RegisterOutcome};
use crate::application::bootstrap::bootstrap_workspace;
use crate::application::enhancement::apply_enhancement;
use crate::domain::models::{FilterKind, Priority, Settings, Subtask, Task, User, ViewKind};
use crate::domain::pipeline::{Selection, SelectionQuery, select_tasks};
use crate::domain::timer::{FocusTimer, TickOutcome, TickToken, TimerExpiry, TimerMode};
use crate::infrastructure::alert::{AlertSink, LogAlertSink};
use crate::infrastructure::config::{read_ai_model, read_timezone};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::gemini_client::{EnhancementClient, ReqwestGeminiClient};
use crate::infrastructure::session_store::{KeyringSessionStore, SessionStore};
use crate::infrastructure::storage::{KeyValueStore, SqliteKeyValueStore};
use chrono::{NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

const LOCAL_SCOPE: &str = "local";

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id(prefix: &str) -> String {
    let sequence = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{sequence}", Utc::now().timestamp_micros())
}

pub struct AppState {
    logs_dir: PathBuf,
    timezone: Tz,
    ai_model: String,
    store: Arc<dyn KeyValueStore>,
    sessions: Arc<dyn SessionStore>,
    alerts: Arc<dyn AlertSink>,
    runtime: Arc<Mutex<RuntimeState>>,
    log_guard: Mutex<()>,
}

impl AppState {
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        let store: Arc<dyn KeyValueStore> =
            Arc::new(SqliteKeyValueStore::new(&bootstrap.database_path));
        let sessions: Arc<dyn SessionStore> = Arc::new(KeyringSessionStore::default());
        let alerts: Arc<dyn AlertSink> = Arc::new(LogAlertSink::new(workspace_root.join("logs")));
        Self::assemble(workspace_root, store, sessions, alerts)
    }

    fn assemble(
        workspace_root: PathBuf,
        store: Arc<dyn KeyValueStore>,
        sessions: Arc<dyn SessionStore>,
        alerts: Arc<dyn AlertSink>,
    ) -> Result<Self, InfraError> {
        let config_dir = workspace_root.join("config");
        let logs_dir = workspace_root.join("logs");
        let timezone = read_timezone(&config_dir)?;
        let ai_model = read_ai_model(&config_dir)?;

        let state = Self {
            logs_dir,
            timezone,
            ai_model,
            store,
            sessions,
            alerts,
            runtime: Arc::new(Mutex::new(RuntimeState::default())),
            log_guard: Mutex::new(()),
        };
        state.restore_session();
        Ok(state)
    }

    /// A broken session backend degrades to being signed out instead of
    /// blocking startup.
    fn restore_session(&self) {
        let session = match self.sessions.load_session() {
            Ok(session) => session,
            Err(error) => {
                self.log_error("restore_session", &error.to_string());
                None
            }
        };
        let Ok(mut runtime) = self.runtime.lock() else {
            return;
        };
        runtime.session = session;
        self.reload_scope(&mut runtime);
    }

    fn reload_scope(&self, runtime: &mut RuntimeState) {
        let scope = scope_id(runtime);
        runtime.tasks = self.load_tasks(&scope);
        runtime.settings = self.load_settings(&scope);
    }

    fn load_tasks(&self, scope: &str) -> Vec<Task> {
        let key = format!("tasks:{scope}");
        match self.store.read(&key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(tasks) => tasks,
                Err(error) => {
                    self.log_error("load_tasks", &format!("corrupt blob at {key}: {error}"));
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(error) => {
                self.log_error("load_tasks", &error.to_string());
                Vec::new()
            }
        }
    }

    fn load_settings(&self, scope: &str) -> Settings {
        let key = format!("settings:{scope}");
        match self.store.read(&key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(settings) => settings,
                Err(error) => {
                    self.log_error("load_settings", &format!("corrupt blob at {key}: {error}"));
                    Settings::default()
                }
            },
            Ok(None) => Settings::default(),
            Err(error) => {
                self.log_error("load_settings", &error.to_string());
                Settings::default()
            }
        }
    }

    fn persist_tasks(&self, runtime: &RuntimeState) -> Result<(), InfraError> {
        let key = format!("tasks:{}", scope_id(runtime));
        let raw = serde_json::to_string(&runtime.tasks)?;
        self.store.write(&key, &raw)
    }

    fn persist_settings(&self, runtime: &RuntimeState) -> Result<(), InfraError> {
        let key = format!("settings:{}", scope_id(runtime));
        let raw = serde_json::to_string(&runtime.settings)?;
        self.store.write(&key, &raw)
    }

    fn auth_service(&self) -> AuthService {
        AuthService::new(self.store.clone(), self.sessions.clone())
    }

    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        self.log_error(command, &error.to_string());
        error.to_string()
    }

    pub fn log_info(&self, command: &str, message: &str) {
        self.append_log("info", command, message);
    }

    pub fn log_error(&self, command: &str, message: &str) {
        self.append_log("error", command, message);
    }

    fn append_log(&self, level: &str, command: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        let path = self.logs_dir.join("commands.log");
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }
}

#[derive(Debug, Default)]
struct RuntimeState {
    session: Option<User>,
    tasks: Vec<Task>,
    settings: Settings,
    timer: FocusTimer,
    pending_enhancements: HashSet<String>,
}

fn scope_id(runtime: &RuntimeState) -> String {
    runtime
        .session
        .as_ref()
        .map(|user| user.id.clone())
        .unwrap_or_else(|| LOCAL_SCOPE.to_string())
}

fn lock_runtime(state: &AppState) -> Result<MutexGuard<'_, RuntimeState>, InfraError> {
    state
        .runtime
        .lock()
        .map_err(|error| InfraError::InvalidConfig(format!("runtime lock poisoned: {error}")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayGroupResponse {
    pub day: String,
    pub label: String,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResponse {
    pub tasks: Vec<Task>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<DayGroupResponse>>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub completion_percentage: u32,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerStateResponse {
    pub mode: String,
    pub remaining_seconds: u32,
    pub running: bool,
    pub progress: f64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn parse_view(value: &str) -> Result<ViewKind, InfraError> {
    match value.trim() {
        "tasks" => Ok(ViewKind::Tasks),
        "calendar" => Ok(ViewKind::Calendar),
        "focus" => Ok(ViewKind::Focus),
        other => Err(InfraError::InvalidConfig(format!("unknown view: {other}"))),
    }
}

fn parse_filter(value: &str) -> Result<FilterKind, InfraError> {
    match value.trim() {
        "all" => Ok(FilterKind::All),
        "active" => Ok(FilterKind::Active),
        "scheduled" => Ok(FilterKind::Scheduled),
        "completed" => Ok(FilterKind::Completed),
        other => Err(InfraError::InvalidConfig(format!("unknown filter: {other}"))),
    }
}

fn parse_timer_mode(value: &str) -> Result<TimerMode, InfraError> {
    match value.trim() {
        "focus" => Ok(TimerMode::Focus),
        "break" => Ok(TimerMode::Break),
        other => Err(InfraError::InvalidConfig(format!(
            "unknown timer mode: {other}"
        ))),
    }
}

/// Accepts an RFC 3339 stamp or a bare `YYYY-MM-DD`, the latter anchored at
/// local midnight in the configured timezone.
fn parse_due_date(raw: &str, timezone: Tz) -> Result<chrono::DateTime<Utc>, InfraError> {
    if let Ok(stamp) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(stamp.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| InfraError::InvalidConfig(format!("invalid due date: {raw}")))?;
    let Some(midnight) = date.and_hms_opt(0, 0, 0) else {
        return Err(InfraError::InvalidConfig(format!("invalid due date: {raw}")));
    };
    timezone
        .from_local_datetime(&midnight)
        .earliest()
        .map(|stamp| stamp.with_timezone(&Utc))
        .ok_or_else(|| InfraError::InvalidConfig(format!("invalid due date: {raw}")))
}

fn to_selection_response(selection: Selection) -> SelectionResponse {
    SelectionResponse {
        tasks: selection.tasks,
        groups: selection.groups.map(|groups| {
            groups
                .into_iter()
                .map(|group| DayGroupResponse {
                    day: group.day.to_string(),
                    label: group.label,
                    tasks: group.tasks,
                })
                .collect()
        }),
    }
}

pub fn list_tasks_impl(
    state: &AppState,
    view: String,
    filter: String,
    category: Option<String>,
) -> Result<SelectionResponse, InfraError> {
    let query = SelectionQuery {
        view: parse_view(&view)?,
        filter: parse_filter(&filter)?,
        category: category
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty()),
    };
    let runtime = lock_runtime(state)?;
    let selection = select_tasks(&runtime.tasks, &query, Utc::now(), state.timezone);
    Ok(to_selection_response(selection))
}

/// A blank title is dropped without an error, mirroring the submit behavior
/// of the task input.
pub fn create_task_impl(
    state: &AppState,
    title: String,
    due_date: Option<String>,
) -> Result<Option<Task>, InfraError> {
    let title = title.trim();
    if title.is_empty() {
        return Ok(None);
    }

    let now = Utc::now();
    let due = match due_date.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => parse_due_date(raw, state.timezone)?,
        None => now,
    };
    let task = Task {
        id: next_id("tsk"),
        title: title.to_string(),
        description: None,
        priority: Priority::Medium,
        completed: false,
        created_at: now,
        completed_at: None,
        due_date: Some(due),
        category: None,
        subtasks: Vec::new(),
    };

    let mut runtime = lock_runtime(state)?;
    runtime.tasks.insert(0, task.clone());
    state.persist_tasks(&runtime)?;
    state.log_info("create_task", &format!("created id={}", task.id));
    Ok(Some(task))
}

pub fn toggle_task_impl(state: &AppState, task_id: String) -> Result<Option<Task>, InfraError> {
    let task_id = task_id.trim();
    let mut runtime = lock_runtime(state)?;
    let Some(task) = runtime.tasks.iter_mut().find(|task| task.id == task_id) else {
        return Ok(None);
    };
    task.completed = !task.completed;
    task.completed_at = task.completed.then(Utc::now);
    let updated = task.clone();
    state.persist_tasks(&runtime)?;
    Ok(Some(updated))
}

pub fn update_task_title_impl(
    state: &AppState,
    task_id: String,
    title: String,
) -> Result<Option<Task>, InfraError> {
    let title = title.trim();
    if title.is_empty() {
        return Ok(None);
    }

    let task_id = task_id.trim();
    let mut runtime = lock_runtime(state)?;
    let Some(task) = runtime.tasks.iter_mut().find(|task| task.id == task_id) else {
        return Ok(None);
    };
    task.title = title.to_string();
    let updated = task.clone();
    state.persist_tasks(&runtime)?;
    Ok(Some(updated))
}

pub fn delete_task_impl(state: &AppState, task_id: String) -> Result<bool, InfraError> {
    let task_id = task_id.trim().to_string();
    let mut runtime = lock_runtime(state)?;
    let before = runtime.tasks.len();
    runtime.tasks.retain(|task| task.id != task_id);
    if runtime.tasks.len() == before {
        return Ok(false);
    }

    runtime.pending_enhancements.remove(&task_id);
    state.persist_tasks(&runtime)?;
    state.log_info("delete_task", &format!("deleted id={task_id}"));
    Ok(true)
}

pub fn add_subtask_impl(
    state: &AppState,
    task_id: String,
    title: String,
) -> Result<Option<Task>, InfraError> {
    let title = title.trim();
    if title.is_empty() {
        return Ok(None);
    }

    let task_id = task_id.trim();
    let mut runtime = lock_runtime(state)?;
    let Some(task) = runtime.tasks.iter_mut().find(|task| task.id == task_id) else {
        return Ok(None);
    };
    task.subtasks.push(Subtask {
        id: next_id("sub"),
        title: title.to_string(),
        completed: false,
    });
    let updated = task.clone();
    state.persist_tasks(&runtime)?;
    Ok(Some(updated))
}

pub fn toggle_subtask_impl(
    state: &AppState,
    task_id: String,
    subtask_id: String,
) -> Result<Option<Task>, InfraError> {
    let task_id = task_id.trim();
    let subtask_id = subtask_id.trim();
    let mut runtime = lock_runtime(state)?;
    let Some(task) = runtime.tasks.iter_mut().find(|task| task.id == task_id) else {
        return Ok(None);
    };
    let Some(subtask) = task
        .subtasks
        .iter_mut()
        .find(|subtask| subtask.id == subtask_id)
    else {
        return Ok(None);
    };
    subtask.completed = !subtask.completed;
    let updated = task.clone();
    state.persist_tasks(&runtime)?;
    Ok(Some(updated))
}

pub fn delete_subtask_impl(
    state: &AppState,
    task_id: String,
    subtask_id: String,
) -> Result<Option<Task>, InfraError> {
    let task_id = task_id.trim();
    let subtask_id = subtask_id.trim();
    let mut runtime = lock_runtime(state)?;
    let Some(task) = runtime.tasks.iter_mut().find(|task| task.id == task_id) else {
        return Ok(None);
    };
    task.subtasks.retain(|subtask| subtask.id != subtask_id);
    let updated = task.clone();
    state.persist_tasks(&runtime)?;
    Ok(Some(updated))
}

pub fn get_stats_impl(state: &AppState) -> Result<StatsResponse, InfraError> {
    let runtime = lock_runtime(state)?;
    let total = runtime.tasks.len();
    let completed = runtime.tasks.iter().filter(|task| task.completed).count();
    let completion_percentage = if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as u32
    };
    Ok(StatsResponse {
        total,
        active: total - completed,
        completed,
        completion_percentage,
    })
}

/// At most one enhancement per task is in flight; a second request while one
/// is pending is dropped. A task deleted mid-flight discards the suggestion.
/// Client failures resolve to no change.
pub async fn enhance_task_impl(
    state: &AppState,
    client: &dyn EnhancementClient,
    task_id: String,
) -> Result<Option<Task>, InfraError> {
    let task_id = task_id.trim().to_string();
    if task_id.is_empty() {
        return Err(InfraError::InvalidConfig(
            "task_id must not be empty".to_string(),
        ));
    }

    let title = {
        let mut runtime = lock_runtime(state)?;
        let Some(task) = runtime.tasks.iter().find(|task| task.id == task_id) else {
            return Ok(None);
        };
        let title = task.title.clone();
        if !runtime.pending_enhancements.insert(task_id.clone()) {
            return Ok(None);
        }
        title
    };

    let enhancement = match client.enhance(&title).await {
        Ok(enhancement) => enhancement,
        Err(error) => {
            if let Ok(mut runtime) = lock_runtime(state) {
                runtime.pending_enhancements.remove(&task_id);
            }
            state.log_error("enhance_task", &error.to_string());
            return Ok(None);
        }
    };

    let mut runtime = lock_runtime(state)?;
    runtime.pending_enhancements.remove(&task_id);
    let Some(task) = runtime.tasks.iter_mut().find(|task| task.id == task_id) else {
        return Ok(None);
    };
    apply_enhancement(task, &enhancement, || next_id("sub"));
    let updated = task.clone();
    state.persist_tasks(&runtime)?;
    state.log_info("enhance_task", &format!("enhanced id={task_id}"));
    Ok(Some(updated))
}

pub async fn enhance_task_via_api_impl(
    state: &AppState,
    task_id: String,
) -> Result<Option<Task>, InfraError> {
    let Some(client) = ReqwestGeminiClient::from_env(state.ai_model.clone()) else {
        state.log_error("enhance_task", "no api key configured; enhancement unavailable");
        return Ok(None);
    };
    enhance_task_impl(state, &client, task_id).await
}

fn to_timer_response(timer: &FocusTimer) -> TimerStateResponse {
    TimerStateResponse {
        mode: timer.mode().as_str().to_string(),
        remaining_seconds: timer.remaining_seconds(),
        running: timer.is_running(),
        progress: timer.progress(),
    }
}

pub fn start_timer_impl(state: &AppState) -> Result<TimerStateResponse, InfraError> {
    let runtime_handle = state.runtime.clone();
    let alerts = state.alerts.clone();
    let mut runtime = lock_runtime(state)?;
    if let Some(token) = runtime.timer.start() {
        spawn_countdown(runtime_handle, alerts, token);
    }
    Ok(to_timer_response(&runtime.timer))
}

pub fn pause_timer_impl(state: &AppState) -> Result<TimerStateResponse, InfraError> {
    let mut runtime = lock_runtime(state)?;
    runtime.timer.pause();
    Ok(to_timer_response(&runtime.timer))
}

pub fn reset_timer_impl(state: &AppState) -> Result<TimerStateResponse, InfraError> {
    let mut runtime = lock_runtime(state)?;
    runtime.timer.reset();
    Ok(to_timer_response(&runtime.timer))
}

pub fn switch_timer_mode_impl(
    state: &AppState,
    mode: String,
) -> Result<TimerStateResponse, InfraError> {
    let mode = parse_timer_mode(&mode)?;
    let mut runtime = lock_runtime(state)?;
    runtime.timer.switch_mode(mode);
    Ok(to_timer_response(&runtime.timer))
}

pub fn get_timer_impl(state: &AppState) -> Result<TimerStateResponse, InfraError> {
    let runtime = lock_runtime(state)?;
    Ok(to_timer_response(&runtime.timer))
}

/// Decrements once per second until the tick permit goes stale or the
/// interval expires. Pause, reset and mode switches invalidate the permit,
/// which ends the task on its next wakeup. Spawned on tauri's managed
/// runtime: sync commands run on the main thread with no ambient tokio
/// context, so a bare `tokio::spawn` here would panic.
fn spawn_countdown(
    runtime: Arc<Mutex<RuntimeState>>,
    alerts: Arc<dyn AlertSink>,
    mut token: TickToken,
) {
    tauri::async_runtime::spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            let (outcome, settings) = {
                let Ok(mut guard) = runtime.lock() else {
                    break;
                };
                (guard.timer.tick(token), guard.settings.clone())
            };
            match outcome {
                TickOutcome::Stale => break,
                TickOutcome::Ticked(next) => token = next,
                TickOutcome::Expired(expiry) => {
                    emit_expiry_alerts(&settings, alerts.as_ref(), expiry);
                    break;
                }
            }
        }
    });
}

fn emit_expiry_alerts(settings: &Settings, alerts: &dyn AlertSink, expiry: TimerExpiry) {
    if settings.sound_enabled {
        alerts.play_sound();
    }
    if settings.notifications_enabled {
        let (title, body) = match expiry.ended_mode {
            TimerMode::Focus => ("Foco concluído", "Hora de fazer uma pausa."),
            TimerMode::Break => ("Pausa concluída", "De volta ao foco."),
        };
        alerts.notify(title, body);
    }
}

pub fn get_settings_impl(state: &AppState) -> Result<Settings, InfraError> {
    let runtime = lock_runtime(state)?;
    Ok(runtime.settings.clone())
}

pub fn update_settings_impl(
    state: &AppState,
    sound_enabled: bool,
    notifications_enabled: bool,
) -> Result<Settings, InfraError> {
    let mut runtime = lock_runtime(state)?;
    runtime.settings = Settings {
        sound_enabled,
        notifications_enabled,
    };
    state.persist_settings(&runtime)?;
    Ok(runtime.settings.clone())
}

pub fn login_impl(
    state: &AppState,
    email: String,
    password: String,
) -> Result<Option<User>, InfraError> {
    let Some(user) = state.auth_service().login(&email, &password)? else {
        return Ok(None);
    };

    let mut runtime = lock_runtime(state)?;
    runtime.session = Some(user.clone());
    state.reload_scope(&mut runtime);
    state.log_info("login", &format!("user id={}", user.id));
    Ok(Some(user))
}

pub fn register_impl(
    state: &AppState,
    name: String,
    email: String,
    password: String,
) -> Result<RegisterResponse, InfraError> {
    if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(InfraError::InvalidConfig(
            "name, email and password must not be empty".to_string(),
        ));
    }

    match state
        .auth_service()
        .register(&name, &email, &password, next_id("usr"))?
    {
        RegisterOutcome::Registered(user) => {
            let mut runtime = lock_runtime(state)?;
            runtime.session = Some(user.clone());
            state.reload_scope(&mut runtime);
            state.log_info("register", &format!("user id={}", user.id));
            Ok(RegisterResponse {
                user: Some(user),
                error: None,
            })
        }
        RegisterOutcome::EmailTaken => Ok(RegisterResponse {
            user: None,
            error: Some(EMAIL_TAKEN_MESSAGE.to_string()),
        }),
    }
}

pub fn logout_impl(state: &AppState) -> Result<(), InfraError> {
    state.auth_service().logout()?;
    let mut runtime = lock_runtime(state)?;
    runtime.session = None;
    state.reload_scope(&mut runtime);
    state.log_info("logout", "session cleared");
    Ok(())
}

pub fn current_user_impl(state: &AppState) -> Result<Option<User>, InfraError> {
    let runtime = lock_runtime(state)?;
    Ok(runtime.session.clone())
}
