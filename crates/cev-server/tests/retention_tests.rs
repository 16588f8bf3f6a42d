//! Retention and concurrency tests
//!
//! The system keeps only the newest datasets. These tests race uploads against
//! each other and against readers and check the bound and snapshot reads hold.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod helpers;

use std::collections::BTreeSet;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use helpers::{authed, upload_request, TestApp, SAMPLE_CSV};
use serde_json::Value;
use tower::ServiceExt;

async fn call(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn stored_ids(app: &TestApp) -> Vec<i64> {
    sqlx::query_scalar("SELECT id FROM datasets ORDER BY id")
        .fetch_all(app.store.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_sixth_upload_evicts_oldest() {
    let app = TestApp::new().await;

    let mut ids = Vec::new();
    for i in 0..5 {
        ids.push(app.upload_ok(&format!("batch_{i}.csv")).await);
    }

    let (status, body) = app.upload("batch_5.csv", SAMPLE_CSV).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["meta"]["evicted"], serde_json::json!([ids[0]]));

    let newest = body["data"]["id"].as_i64().unwrap();
    let mut expected: Vec<i64> = ids[1..].to_vec();
    expected.push(newest);
    assert_eq!(stored_ids(&app).await, expected);

    let orphaned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM equipment WHERE dataset_id = ?")
        .bind(ids[0])
        .fetch_one(app.store.pool())
        .await
        .unwrap();
    assert_eq!(orphaned, 0);
}

#[tokio::test]
async fn test_configured_limit_is_honored() {
    let app = TestApp::with_config(|config| config.datasets.retention_limit = 2).await;

    for i in 0..4 {
        app.upload_ok(&format!("batch_{i}.csv")).await;
    }

    assert_eq!(app.store.count().await.unwrap(), 2);

    let (_, body) = app.send_json(authed(Method::GET, "/datasets")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["limit"], 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_uploads_keep_exactly_five() {
    let app = TestApp::new().await;

    let mut existing = Vec::new();
    for i in 0..4 {
        existing.push(app.upload_ok(&format!("existing_{i}.csv")).await);
    }

    let uploads: Vec<_> = (0..3)
        .map(|i| {
            let router = app.router.clone();
            tokio::spawn(async move {
                call(router, upload_request(&format!("racing_{i}.csv"), SAMPLE_CSV.as_bytes())).await
            })
        })
        .collect();

    let mut created = Vec::new();
    let mut evicted = BTreeSet::new();
    for upload in futures::future::join_all(uploads).await {
        let (status, body) = upload.unwrap();
        assert_eq!(status, StatusCode::CREATED, "{body}");
        created.push(body["data"]["id"].as_i64().unwrap());
        for id in body["meta"]["evicted"].as_array().unwrap() {
            evicted.insert(id.as_i64().unwrap());
        }
    }

    assert_eq!(app.store.count().await.unwrap(), 5);

    // The two oldest of the seven are the ones evicted
    let mut all: Vec<i64> = existing.iter().chain(created.iter()).copied().collect();
    all.sort_unstable();
    assert_eq!(evicted, all[..2].iter().copied().collect::<BTreeSet<_>>());
    assert_eq!(stored_ids(&app).await, all[2..].to_vec());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_see_partial_datasets() {
    let app = TestApp::new().await;
    let big_csv = {
        let mut csv = String::from("Equipment Name,Type,Flowrate,Pressure,Temperature\n");
        for i in 0..1200 {
            csv.push_str(&format!("E-{i},Pump,{i},2,25\n"));
        }
        csv
    };

    let writer = {
        let router = app.router.clone();
        let csv = big_csv.clone();
        tokio::spawn(async move {
            for i in 0..8 {
                let (status, _) = call(router.clone(), upload_request(&format!("big_{i}.csv"), csv.as_bytes())).await;
                assert_eq!(status, StatusCode::CREATED);
            }
        })
    };

    let reader = {
        let router = app.router.clone();
        tokio::spawn(async move {
            let mut observed = 0;
            for _ in 0..40 {
                let (_, list) = call(router.clone(), authed(Method::GET, "/datasets")).await;
                for summary in list["data"].as_array().unwrap() {
                    let id = summary["id"].as_i64().unwrap();
                    let (status, detail) = call(router.clone(), authed(Method::GET, &format!("/datasets/{id}"))).await;
                    if status == StatusCode::NOT_FOUND {
                        continue;
                    }
                    assert_eq!(status, StatusCode::OK, "{detail}");
                    let rows = detail["data"]["equipment_items"].as_array().unwrap().len() as u64;
                    assert_eq!(rows, detail["data"]["total_count"].as_u64().unwrap());
                    observed += 1;
                }
                tokio::task::yield_now().await;
            }
            observed
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();

    assert_eq!(app.store.count().await.unwrap(), 5);
}
