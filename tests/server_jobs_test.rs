use healthdata::{start_server, ServiceConfig};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

async fn spawn_server(port: u16) -> String {
    let mut config = ServiceConfig::default();
    config.server.port = port;
    tokio::spawn(async move {
        start_server(config).await.unwrap();
    });
    sleep(Duration::from_millis(500)).await;
    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn test_server_background_job_lifecycle() {
    let base_url = spawn_server(8305).await;
    let client = reqwest::Client::new();

    // 1. Upload a dataset
    let part = Part::bytes(b"region,value\nNorth,1.5\nSouth,2.5\nNorth,\n".to_vec())
        .file_name("regions.csv")
        .mime_str("text/csv")
        .unwrap();
    let resp = client
        .post(format!("{}/api/v1/upload", base_url))
        .multipart(Form::new().part("file", part))
        .send()
        .await
        .expect("Failed to upload");
    assert_eq!(resp.status(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["rows"], 3);

    // 2. Submit a job
    let resp = client
        .post(format!("{}/api/v1/summarize", base_url))
        .send()
        .await
        .expect("Failed to submit job");
    assert_eq!(resp.status(), 200);
    let json: Value = resp.json().await.unwrap();
    let job_id = json["job_id"].as_str().expect("job_id missing").to_string();

    // 3. Poll for completion; status only ever moves forward
    let order = ["pending", "running", "completed"];
    let mut last_rank = 0;
    let mut final_job = Value::Null;
    for _ in 0..50 {
        let poll_json: Value = client
            .get(format!("{}/api/v1/jobs/{}", base_url, job_id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let status = poll_json["status"].as_str().unwrap();
        let rank = order.iter().position(|s| *s == status).expect("unexpected status");
        assert!(rank >= last_rank, "status went backwards to {}", status);
        last_rank = rank;

        if status == "completed" {
            final_job = poll_json;
            break;
        }
        sleep(Duration::from_millis(100)).await;
    }

    assert!(final_job.is_object(), "Job did not complete in time");
    assert!(final_job["error"].is_null());
    let missing = &final_job["result"]["missing_values"]["value"];
    assert_eq!(missing["null_count"], 1);
    let pct = missing["null_percentage"].as_f64().unwrap();
    assert!((pct - 100.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_server_job_not_found() {
    let base_url = spawn_server(8306).await;
    let client = reqwest::Client::new();
    let random_id = uuid::Uuid::new_v4();
    let resp = client
        .get(format!("{}/api/v1/jobs/{}", base_url, random_id))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
}
