mod common;

use tempfile::TempDir;

use common::spawn_app;

#[tokio::test]
async fn health_check_works() {
    let root = TempDir::new().unwrap();
    let address = spawn_app(root.path()).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{address}/health-check"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(Some(0), response.content_length());
}
