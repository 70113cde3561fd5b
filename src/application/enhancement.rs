use crate::domain::models::{Priority, Subtask, Task};
use crate::infrastructure::gemini_client::TaskEnhancement;

/// Folds a suggestion into a task. Description, priority and category are
/// overwritten; suggested steps are appended after the existing subtasks.
/// Blank suggested steps are dropped.
pub fn apply_enhancement<F>(task: &mut Task, enhancement: &TaskEnhancement, mut next_subtask_id: F)
where
    F: FnMut() -> String,
{
    task.description = Some(enhancement.description.clone());
    task.priority = Priority::from_label(&enhancement.priority);
    task.category = Some(enhancement.category.clone());

    for title in &enhancement.subtasks {
        let title = title.trim();
        if title.is_empty() {
            continue;
        }
        task.subtasks.push(Subtask {
            id: next_subtask_id(),
            title: title.to_string(),
            completed: false,
        });
    }
}
