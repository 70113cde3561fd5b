use crate::domain::models::{FilterKind, Task, ViewKind};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use std::cmp::Ordering;

/// Raw millisecond window of the priority tie-break. Kept as a plain
/// difference rather than calendar-day equality to match the shipped
/// behavior near midnight.
pub const SAME_DAY_WINDOW_MS: i64 = 86_400_000;

const MONTHS_PT: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionQuery {
    pub view: ViewKind,
    pub filter: FilterKind,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayGroup {
    pub day: NaiveDate,
    pub label: String,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub tasks: Vec<Task>,
    pub groups: Option<Vec<DayGroup>>,
}

/// Filters, sorts and (for the scheduled filter) day-groups the task
/// collection. Pure: current time and timezone are explicit inputs and the
/// input collection is never mutated.
pub fn select_tasks(
    tasks: &[Task],
    query: &SelectionQuery,
    now: DateTime<Utc>,
    timezone: Tz,
) -> Selection {
    let end_of_today = end_of_local_day(now, timezone);
    let mut selected: Vec<Task> = tasks
        .iter()
        .filter(|task| retain(task, query, end_of_today))
        .cloned()
        .collect();
    selected.sort_by(compare_tasks);

    let groups = (query.view == ViewKind::Tasks && query.filter == FilterKind::Scheduled)
        .then(|| group_by_due_day(&selected, now, timezone));

    Selection {
        tasks: selected,
        groups,
    }
}

/// Current local date at 23:59:59.999, recomputed per invocation.
pub fn end_of_local_day(now: DateTime<Utc>, timezone: Tz) -> DateTime<Utc> {
    let local_day = now.with_timezone(&timezone).date_naive();
    let Some(end) = local_day.and_hms_milli_opt(23, 59, 59, 999) else {
        return now;
    };
    match timezone.from_local_datetime(&end).earliest() {
        Some(stamp) => stamp.with_timezone(&Utc),
        None => now,
    }
}

fn retain(task: &Task, query: &SelectionQuery, end_of_today: DateTime<Utc>) -> bool {
    if query.view != ViewKind::Tasks {
        return true;
    }
    if let Some(category) = query.category.as_deref() {
        if task.category.as_deref() != Some(category) {
            return false;
        }
    }
    match query.filter {
        FilterKind::All => true,
        FilterKind::Active => {
            !task.completed && task.due_date.map(|due| due <= end_of_today).unwrap_or(true)
        }
        FilterKind::Scheduled => {
            !task.completed && task.due_date.map(|due| due > end_of_today).unwrap_or(false)
        }
        FilterKind::Completed => task.completed,
    }
}

/// Composite comparator: incomplete before completed, then the 24h-window
/// priority tie-break, then date (descending for completed pairs, ascending
/// for incomplete pairs). Exact ties report Equal so a stable sort preserves
/// input order.
pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    match (a.completed, b.completed) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        _ => {
            let date_a = sort_instant(a);
            let date_b = sort_instant(b);
            let difference_ms =
                (date_a.timestamp_millis() - date_b.timestamp_millis()).abs();
            if difference_ms < SAME_DAY_WINDOW_MS {
                b.priority.weight().cmp(&a.priority.weight())
            } else if a.completed {
                date_b.cmp(&date_a)
            } else {
                date_a.cmp(&date_b)
            }
        }
    }
}

fn sort_instant(task: &Task) -> DateTime<Utc> {
    if task.completed {
        task.completed_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    } else {
        task.due_date.unwrap_or(task.created_at)
    }
}

fn group_by_due_day(tasks: &[Task], now: DateTime<Utc>, timezone: Tz) -> Vec<DayGroup> {
    let today = now.with_timezone(&timezone).date_naive();
    let mut groups: Vec<DayGroup> = Vec::new();
    for task in tasks {
        let Some(due) = task.due_date else {
            continue;
        };
        let day = due.with_timezone(&timezone).date_naive();
        match groups.iter_mut().find(|group| group.day == day) {
            Some(group) => group.tasks.push(task.clone()),
            None => groups.push(DayGroup {
                day,
                label: day_label(day, today),
                tasks: vec![task.clone()],
            }),
        }
    }
    groups
}

/// "Amanhã" for tomorrow, otherwise the pt-BR weekday + date with the first
/// letter capitalized, e.g. "Sexta-feira, 28 de agosto".
pub fn day_label(day: NaiveDate, today: NaiveDate) -> String {
    if Some(day) == today.succ_opt() {
        return "Amanhã".to_string();
    }
    let formatted = format!(
        "{}, {} de {}",
        weekday_pt(day.weekday()),
        day.day(),
        MONTHS_PT[day.month0() as usize]
    );
    capitalize_first(&formatted)
}

fn weekday_pt(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "segunda-feira",
        Weekday::Tue => "terça-feira",
        Weekday::Wed => "quarta-feira",
        Weekday::Thu => "quinta-feira",
        Weekday::Fri => "sexta-feira",
        Weekday::Sat => "sábado",
        Weekday::Sun => "domingo",
    }
}

fn capitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
