use std::sync::Arc;

use tokio::net::TcpListener;
use tribu_sync::lock::TICK_LOCK;
use tribu_sync::{Lock, LockManager};

use crate::support::{harness, link_only, Harness};

async fn start(h: &Harness) -> String {
    let app = tribu_sync::http::router(Arc::clone(&h.worker));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn health_reports_ok() {
    let h = harness();
    let base = start(&h).await;

    let body: serde_json::Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, serde_json::json!({ "ok": true }));
}

#[tokio::test]
async fn sync_now_runs_a_tick_and_status_reflects_it() {
    let h = harness();
    h.directory.create("people/c1").unwrap();
    h.worker
        .queue()
        .enqueue("c-1", "people/c1", None, &link_only("c-1", "people/c1"))
        .unwrap();
    let base = start(&h).await;
    let client = reqwest::Client::new();

    let status: serde_json::Value = client
        .get(format!("{}/sync/status", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["pending"], 1);
    assert_eq!(status["sample"][0]["local_id"], "c-1");
    assert!(status["last_report"].is_null());

    let res = client
        .post(format!("{}/sync/now", base))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let report: serde_json::Value = res.json().await.unwrap();
    assert_eq!(report["stats"]["done"], 1);
    assert!(report["error"].is_null());

    let status: serde_json::Value = client
        .get(format!("{}/sync/status", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["pending"], 0);
    assert_eq!(status["last_report"]["stats"]["processed"], 1);
}

#[tokio::test]
async fn sync_now_conflicts_while_a_tick_runs() {
    let h = harness();
    let base = start(&h).await;
    let lock = h.locks.get_lock(TICK_LOCK).unwrap();
    assert!(lock.try_lock().unwrap());

    let res = reqwest::Client::new()
        .post(format!("{}/sync/now", base))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 409);

    lock.unlock().unwrap();
    let res = reqwest::Client::new()
        .post(format!("{}/sync/now", base))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
}
