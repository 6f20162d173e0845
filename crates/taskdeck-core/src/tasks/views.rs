//! Derived task views.
//!
//! Pure functions over a collection snapshot. Nothing here is stored: the
//! store calls these on every read so the views can never drift from the
//! collection they were computed from.

use chrono::{DateTime, Local, NaiveDate, Utc};

use crate::models::Task;

/// Calendar date of `timestamp` in the local timezone.
pub fn local_date(timestamp: DateTime<Utc>) -> NaiveDate {
    timestamp.with_timezone(&Local).date_naive()
}

/// Today's local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Tasks whose title or description contains `term`, ignoring case.
///
/// A blank term matches everything, preserving collection order.
pub fn filter_tasks<'a>(tasks: &'a [Task], term: &str) -> Vec<&'a Task> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return tasks.iter().collect();
    }
    tasks
        .iter()
        .filter(|task| {
            task.title.to_lowercase().contains(&needle)
                || task.description.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Incomplete tasks created on `today`. Always a subset of [`pending_tasks`].
pub fn today_tasks(tasks: &[Task], today: NaiveDate) -> Vec<&Task> {
    TaskView::Today.select(tasks, today)
}

pub fn completed_tasks(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter().filter(|task| task.completed).collect()
}

pub fn pending_tasks(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter().filter(|task| !task.completed).collect()
}

/// Counts of each lens. `today` overlaps `pending` by construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub today: usize,
    pub completed: usize,
    pub pending: usize,
}

pub fn stats(tasks: &[Task], today: NaiveDate) -> TaskStats {
    TaskStats {
        total: tasks.len(),
        today: today_tasks(tasks, today).len(),
        completed: completed_tasks(tasks).len(),
        pending: pending_tasks(tasks).len(),
    }
}

/// Which lens a listing should show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskView {
    #[default]
    All,
    Today,
    Completed,
    Pending,
}

impl TaskView {
    pub fn title(self) -> &'static str {
        match self {
            TaskView::All => "All Tasks",
            TaskView::Today => "Today's Tasks",
            TaskView::Completed => "Completed Tasks",
            TaskView::Pending => "Pending Tasks",
        }
    }

    pub fn contains(self, task: &Task, today: NaiveDate) -> bool {
        match self {
            TaskView::All => true,
            TaskView::Today => !task.completed && local_date(task.created_at) == today,
            TaskView::Completed => task.completed,
            TaskView::Pending => !task.completed,
        }
    }

    pub fn select(self, tasks: &[Task], today: NaiveDate) -> Vec<&Task> {
        tasks
            .iter()
            .filter(|task| self.contains(task, today))
            .collect()
    }
}
