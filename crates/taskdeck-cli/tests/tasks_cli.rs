//! Integration tests for `taskdeck tasks ...`.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use chrono::Utc;
use predicates::prelude::*;
use serde_json::json;
use tempfile::{TempDir, tempdir};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn task_json(id: &str, title: &str, description: &str, completed: bool) -> serde_json::Value {
    json!({
        "_id": id,
        "title": title,
        "description": description,
        "completed": completed,
        "createAt": Utc::now().to_rfc3339(),
        "__v": 0
    })
}

fn listing() -> serde_json::Value {
    json!([
        task_json("t1", "Buy milk", "2 liters", false),
        task_json("t2", "Walk dog", "", true),
    ])
}

async fn signed_in_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": "u1", "names": "Ada", "email": "ada@example.com" }
        })))
        .mount(&server)
        .await;
    server
}

async fn mount_listing(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing()))
        .mount(server)
        .await;
}

fn taskdeck(home: &TempDir, server: &MockServer) -> Command {
    let mut cmd = cargo_bin_cmd!("taskdeck");
    cmd.env("TASKDECK_HOME", home.path())
        .env("TASKDECK_API_URL", server.uri());
    cmd
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_list_all() {
    let server = signed_in_server().await;
    mount_listing(&server).await;
    let home = tempdir().unwrap();

    taskdeck(&home, &server)
        .args(["tasks", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All Tasks (2)"))
        .stdout(predicate::str::contains("[ ] t1  Buy milk"))
        .stdout(predicate::str::contains("[x] t2  Walk dog"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_list_search_and_view() {
    let server = signed_in_server().await;
    mount_listing(&server).await;
    let home = tempdir().unwrap();

    taskdeck(&home, &server)
        .args(["tasks", "list", "--search", "MILK"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Buy milk"))
        .stdout(predicate::str::contains("Walk dog").not());

    taskdeck(&home, &server)
        .args(["tasks", "list", "--view", "completed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Completed Tasks (1)"))
        .stdout(predicate::str::contains("Walk dog"));

    taskdeck(&home, &server)
        .args(["tasks", "list", "--view", "today", "--search", "dog"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No tasks found."));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_protected_command_requires_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    let home = tempdir().unwrap();

    taskdeck(&home, &server)
        .args(["tasks", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in. Run `taskdeck login`."));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_add_creates_then_refreshes() {
    let server = signed_in_server().await;
    mount_listing(&server).await;
    Mock::given(method("POST"))
        .and(path("/tasks"))
        .and(body_json(json!({ "title": "File taxes", "description": "" })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(task_json("t3", "File taxes", "", false)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let home = tempdir().unwrap();

    taskdeck(&home, &server)
        .args(["tasks", "add", "File taxes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Success! Task created successfully"))
        .stdout(predicate::str::contains("[ ] t3  File taxes"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_add_blank_title_rejected() {
    let server = signed_in_server().await;
    mount_listing(&server).await;
    let home = tempdir().unwrap();

    taskdeck(&home, &server)
        .args(["tasks", "add", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("title: Title is required"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_update_marks_done() {
    let server = signed_in_server().await;
    mount_listing(&server).await;
    Mock::given(method("PUT"))
        .and(path("/tasks/t1"))
        .and(body_json(json!({ "completed": true })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(task_json("t1", "Buy milk", "2 liters", true)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let home = tempdir().unwrap();

    taskdeck(&home, &server)
        .args(["tasks", "update", "t1", "--done"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Success! Task updated successfully"))
        .stdout(predicate::str::contains("[x] t1  Buy milk"));

    taskdeck(&home, &server)
        .args(["tasks", "update", "t1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to update"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rm_failure_shows_collapsed_message() {
    let server = signed_in_server().await;
    mount_listing(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/tasks/t1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database exploded"))
        .mount(&server)
        .await;
    let home = tempdir().unwrap();

    taskdeck(&home, &server)
        .args(["tasks", "rm", "t1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to delete task"))
        .stderr(predicate::str::contains("database exploded").not());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_show_and_stats() {
    let server = signed_in_server().await;
    mount_listing(&server).await;
    Mock::given(method("GET"))
        .and(path("/tasks/t1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(task_json("t1", "Buy milk", "2 liters", false)),
        )
        .mount(&server)
        .await;
    let home = tempdir().unwrap();

    taskdeck(&home, &server)
        .args(["tasks", "show", "t1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Buy milk"))
        .stdout(predicate::str::contains("status:  pending"))
        .stdout(predicate::str::contains("2 liters"));

    taskdeck(&home, &server)
        .args(["tasks", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total:     2"))
        .stdout(predicate::str::contains("Today:     1"))
        .stdout(predicate::str::contains("Completed: 1"))
        .stdout(predicate::str::contains("Pending:   1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stats_fails_when_listing_fails() {
    let server = signed_in_server().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database exploded"))
        .mount(&server)
        .await;
    let home = tempdir().unwrap();

    taskdeck(&home, &server)
        .args(["tasks", "stats"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Total:").not())
        .stderr(predicate::str::contains("Failed to fetch tasks"))
        .stderr(predicate::str::contains("database exploded").not());
}
