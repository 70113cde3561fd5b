use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn weight(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Maps the Portuguese labels used by the enhancement collaborator.
    /// Unrecognized labels fall back to Medium.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Alta" => Self::High,
            "Baixa" => Self::Low,
            _ => Self::Medium,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Baixa",
            Self::Medium => "Média",
            Self::High => "Alta",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

impl Subtask {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "subtask.id")?;
        validate_non_empty(&self.title, "subtask.title")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub priority: Priority,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl Task {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "task.id")?;
        validate_non_empty(&self.title, "task.title")?;
        if self.completed != self.completed_at.is_some() {
            return Err(
                "task.completed_at must be present exactly when task.completed is true".to_string(),
            );
        }
        for subtask in &self.subtasks {
            subtask.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_sound_enabled")]
    pub sound_enabled: bool,
    #[serde(default)]
    pub notifications_enabled: bool,
}

fn default_sound_enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            notifications_enabled: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl User {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "user.id")?;
        validate_non_empty(&self.email, "user.email")?;
        validate_non_empty(&self.name, "user.name")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Tasks,
    Calendar,
    Focus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    All,
    Active,
    Scheduled,
    Completed,
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_time(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn sample_task() -> Task {
        Task {
            id: "tsk-1".to_string(),
            title: "Comprar leite".to_string(),
            description: None,
            priority: Priority::Medium,
            completed: false,
            created_at: fixed_time("2026-08-20T10:00:00Z"),
            completed_at: None,
            due_date: Some(fixed_time("2026-08-20T10:00:00Z")),
            category: Some("Casa".to_string()),
            subtasks: vec![Subtask {
                id: "sub-1".to_string(),
                title: "Checar validade".to_string(),
                completed: false,
            }],
        }
    }

    #[test]
    fn task_validate_accepts_valid_task() {
        assert!(sample_task().validate().is_ok());
    }

    #[test]
    fn task_validate_rejects_empty_title() {
        let mut task = sample_task();
        task.title = "   ".to_string();
        assert!(task.validate().is_err());
    }

    #[test]
    fn task_validate_enforces_completed_at_invariant() {
        let mut task = sample_task();
        task.completed = true;
        assert!(task.validate().is_err());

        task.completed_at = Some(fixed_time("2026-08-21T09:00:00Z"));
        assert!(task.validate().is_ok());

        task.completed = false;
        assert!(task.validate().is_err());
    }

    #[test]
    fn subtask_validate_rejects_empty_title() {
        let subtask = Subtask {
            id: "sub-1".to_string(),
            title: "".to_string(),
            completed: false,
        };
        assert!(subtask.validate().is_err());
    }

    #[test]
    fn priority_label_mapping_defaults_to_medium() {
        assert_eq!(Priority::from_label("Alta"), Priority::High);
        assert_eq!(Priority::from_label(" Baixa "), Priority::Low);
        assert_eq!(Priority::from_label("Média"), Priority::Medium);
        assert_eq!(Priority::from_label("urgente"), Priority::Medium);
        assert_eq!(Priority::from_label(""), Priority::Medium);
    }

    #[test]
    fn priority_labels_roundtrip_through_from_label() {
        for priority in [Priority::Low, Priority::Medium, Priority::High] {
            assert_eq!(Priority::from_label(priority.label()), priority);
        }
    }

    #[test]
    fn priority_weight_is_strictly_increasing() {
        assert!(Priority::Low.weight() < Priority::Medium.weight());
        assert!(Priority::Medium.weight() < Priority::High.weight());
    }

    #[test]
    fn settings_deserialize_with_missing_fields_uses_defaults() {
        let settings: Settings = serde_json::from_str("{}").expect("deserialize settings");
        assert!(settings.sound_enabled);
        assert!(!settings.notifications_enabled);
    }

    #[test]
    fn domain_models_support_serde_roundtrip() {
        let task = sample_task();
        let settings = Settings::default();
        let user = User {
            id: "usr-1".to_string(),
            email: "preguica@example.com".to_string(),
            name: "Preguiça".to_string(),
        };

        let task_roundtrip: Task =
            serde_json::from_str(&serde_json::to_string(&task).expect("serialize task"))
                .expect("deserialize task");
        let settings_roundtrip: Settings =
            serde_json::from_str(&serde_json::to_string(&settings).expect("serialize settings"))
                .expect("deserialize settings");
        let user_roundtrip: User =
            serde_json::from_str(&serde_json::to_string(&user).expect("serialize user"))
                .expect("deserialize user");

        assert_eq!(task_roundtrip, task);
        assert_eq!(settings_roundtrip, settings);
        assert_eq!(user_roundtrip, user);
    }

    #[test]
    fn task_serializes_with_camel_case_keys() {
        let raw = serde_json::to_string(&sample_task()).expect("serialize task");
        assert!(raw.contains("\"createdAt\""));
        assert!(raw.contains("\"dueDate\""));
        assert!(!raw.contains("\"created_at\""));
    }
}
