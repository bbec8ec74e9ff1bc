#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use healthdata::{router, AppState, ServiceConfig};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tower::util::ServiceExt; // for `oneshot`

pub const HEALTH_CSV: &str =
    "SEX (DISPLAY),YEAR (DISPLAY),Numeric\nMale,2000,10\nFemale,2001,20\nBoth sexes,2002,30";

const BOUNDARY: &str = "healthdata-test-boundary";

pub fn app() -> Router {
    app_with_config(ServiceConfig::default())
}

pub fn app_with_config(config: ServiceConfig) -> Router {
    router(Arc::new(AppState::new(config)))
}

pub fn upload_request(filename: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: text/csv\r\n\r\n{c}\r\n--{b}--\r\n",
        b = BOUNDARY,
        f = filename,
        c = content
    );
    Request::builder()
        .method("POST")
        .uri("/api/v1/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Polls the job endpoint until the job is terminal.
pub async fn wait_for_job(app: &Router, job_id: &str) -> Value {
    for _ in 0..100 {
        let job = json_body(send(app, get(&format!("/api/v1/jobs/{}", job_id))).await).await;
        let status = job["status"].as_str().unwrap().to_string();
        if status == "completed" || status == "failed" {
            return job;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!("Job {} did not finish in time", job_id);
}
