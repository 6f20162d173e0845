//! Task command handlers.

use anyhow::{Result, bail};
use chrono::Local;
use taskdeck_core::models::{Task, TaskId, TaskPatch};
use taskdeck_core::tasks::{TaskSnapshot, TaskView};

use super::{Client, task_failure};

fn status_mark(task: &Task) -> &'static str {
    if task.completed { "[x]" } else { "[ ]" }
}

fn print_row(task: &Task) {
    println!("{} {}  {}", status_mark(task), task.id, task.title);
    if !task.description.is_empty() {
        println!("      {}", task.description);
    }
}

/// Prints the pending notice raised by the last operation.
async fn print_notice(client: &Client) {
    if let Some(notice) = client.ctx().tasks().take_notice().await {
        println!("{notice}");
    }
}

/// The collection loaded by `require_login`, or the fetch failure.
async fn loaded_snapshot(client: &Client) -> Result<TaskSnapshot> {
    let snapshot = client.ctx().tasks().snapshot().await;
    if let Some(error) = &snapshot.error {
        bail!("{error}");
    }
    Ok(snapshot)
}

pub async fn list(client: &Client, search: Option<&str>, view: TaskView) -> Result<()> {
    client.require_login().await?;
    if let Some(term) = search {
        client.ctx().tasks().set_filter(term).await;
    }

    let snapshot = loaded_snapshot(client).await?;
    let shown = snapshot.view(view);

    println!("{} ({})", view.title(), shown.len());
    if shown.is_empty() {
        println!("No tasks found.");
    }
    for task in shown {
        print_row(task);
    }
    Ok(())
}

pub async fn show(client: &Client, id: &str) -> Result<()> {
    client.require_login().await?;
    let task = client
        .ctx()
        .tasks()
        .get(&TaskId::from(id))
        .await
        .map_err(task_failure)?;

    println!("{}", task.title);
    println!("  id:      {}", task.id);
    println!(
        "  status:  {}",
        if task.completed { "completed" } else { "pending" }
    );
    println!(
        "  created: {}",
        task.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
    if !task.description.is_empty() {
        println!();
        println!("{}", task.description);
    }
    Ok(())
}

pub async fn add(client: &Client, title: &str, description: &str) -> Result<()> {
    client.require_login().await?;
    let task = client
        .ctx()
        .tasks()
        .create(title, description)
        .await
        .map_err(task_failure)?;
    print_notice(client).await;
    print_row(&task);
    Ok(())
}

pub async fn update(
    client: &Client,
    id: &str,
    title: Option<String>,
    description: Option<String>,
    completed: Option<bool>,
) -> Result<()> {
    client.require_login().await?;
    let patch = TaskPatch {
        title,
        description,
        completed,
    };
    let task = client
        .ctx()
        .tasks()
        .update(&TaskId::from(id), &patch)
        .await
        .map_err(task_failure)?;
    print_notice(client).await;
    print_row(&task);
    Ok(())
}

pub async fn remove(client: &Client, id: &str) -> Result<()> {
    client.require_login().await?;
    client
        .ctx()
        .tasks()
        .delete(&TaskId::from(id))
        .await
        .map_err(task_failure)?;
    print_notice(client).await;
    Ok(())
}

pub async fn stats(client: &Client) -> Result<()> {
    client.require_login().await?;
    let stats = loaded_snapshot(client).await?.stats();
    println!("Total:     {}", stats.total);
    println!("Today:     {}", stats.today);
    println!("Completed: {}", stats.completed);
    println!("Pending:   {}", stats.pending);
    Ok(())
}
