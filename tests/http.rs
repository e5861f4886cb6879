mod common;

use common::{spawn_mock_store, MockStore, MOCK_KEY};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct LoadResponse {
    id: String,
    empty_miles: Option<u32>,
    loaded_miles: Option<u32>,
    total_miles: u32,
    delivery_location: String,
    rate: Option<f64>,
    status: String,
}

#[derive(Debug, Deserialize)]
struct Summary {
    total_loads: usize,
    total_miles: u64,
    total_revenue: f64,
    total_fuel: f64,
    net_profit: f64,
}

#[derive(Debug, Deserialize)]
struct Range {
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
struct WeekResponse {
    range: Range,
    label: String,
    prev_week: String,
    next_week: String,
    loads: Vec<LoadResponse>,
    summary: Summary,
}

struct TestServer {
    base_url: String,
    config_path: PathBuf,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_file(&self.config_path);
    }
}

#[cfg(unix)]
mod cleanup {
    use std::sync::{Mutex, Once};

    static REGISTER: Once = Once::new();
    static PIDS: Mutex<Vec<i32>> = Mutex::new(Vec::new());

    pub fn register(pid: u32) {
        if let Ok(mut pids) = PIDS.lock() {
            pids.push(pid as i32);
        }
        REGISTER.call_once(|| unsafe {
            libc::atexit(on_exit);
        });
    }

    extern "C" fn on_exit() {
        if let Ok(pids) = PIDS.lock() {
            for &pid in pids.iter().filter(|&&pid| pid > 0) {
                unsafe {
                    libc::kill(pid, libc::SIGTERM);
                }
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_config_path() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("load_manager_http_{}_{}.json", std::process::id(), nanos));
    path
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/health")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server(envs: &[(&str, &str)]) -> TestServer {
    let port = pick_free_port();
    let config_path = unique_config_path();
    let mut command = Command::new(env!("CARGO_BIN_EXE_load_manager"));
    for key in ["LOADS_STORE_URL", "LOADS_STORE_KEY", "LOADS_STORE_TABLE", "LOADS_DEMO", "MILEAGE_UNRESOLVED"] {
        command.env_remove(key);
    }
    command
        .env("PORT", port.to_string())
        .env("APP_CONFIG_PATH", &config_path)
        .env("RUST_LOG", "info")
        .envs(envs.iter().copied())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    let child = command.spawn().expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer {
        base_url,
        config_path,
        child,
    }
}

async fn connected_server(mock: &MockStore) -> TestServer {
    spawn_server(&[
        ("LOADS_STORE_URL", mock.base_url.as_str()),
        ("LOADS_STORE_KEY", MOCK_KEY),
    ])
    .await
}

fn vegas_run() -> Value {
    json!({
        "current_location": "Los Angeles, CA",
        "pickup_location": "Las Vegas, NV",
        "delivery_location": "Phoenix, AZ",
        "pickup_date": "2025-06-11",
        "reference": "LV-77",
        "rate": 1500.0,
        "fuel_cost": 300.0,
        "broker_name": "Desert Freight",
        "status": "In Transit"
    })
}

async fn create(client: &Client, server: &TestServer, body: &Value) -> LoadResponse {
    let response = client
        .post(format!("{}/api/loads", server.base_url))
        .json(body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn week(client: &Client, server: &TestServer, date: &str) -> WeekResponse {
    let response = client
        .get(format!("{}/api/loads?week={date}", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    response.json().await.unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn http_added_load_shows_in_its_week() {
    let mock = spawn_mock_store().await;
    let server = connected_server(&mock).await;
    let client = Client::new();

    let load = create(&client, &server, &vegas_run()).await;
    assert!(load.empty_miles.is_some());
    assert!(load.loaded_miles.is_some());
    assert_eq!(
        load.total_miles,
        load.empty_miles.unwrap() + load.loaded_miles.unwrap()
    );
    assert_eq!(load.status, "In Transit");

    let rows = mock.table.rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["total_miles"], json!(load.total_miles));
    assert!(rows[0]["timestamp"].is_string());

    let report = week(&client, &server, "2025-06-11").await;
    assert_eq!(report.range.start, "2025-06-08");
    assert_eq!(report.range.end, "2025-06-14");
    assert_eq!(report.label, "Week of June 8, 2025");
    assert_eq!(report.prev_week, "2025-06-01");
    assert_eq!(report.next_week, "2025-06-15");
    assert_eq!(report.loads.len(), 1);
    assert_eq!(report.loads[0].id, load.id);
    assert_eq!(report.summary.total_loads, 1);
    assert_eq!(report.summary.total_miles, u64::from(load.total_miles));
    assert_eq!(report.summary.total_revenue, 1500.0);
    assert_eq!(report.summary.total_fuel, 300.0);
    assert_eq!(report.summary.net_profit, 1200.0);

    let next = week(&client, &server, "2025-06-15").await;
    assert!(next.loads.is_empty());
    assert_eq!(next.summary.total_loads, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn http_edit_recomputes_mileage_and_delete_removes() {
    let mock = spawn_mock_store().await;
    let server = connected_server(&mock).await;
    let client = Client::new();

    let load = create(&client, &server, &vegas_run()).await;

    let response = client
        .patch(format!("{}/api/loads/{}", server.base_url, load.id))
        .json(&json!({ "delivery_location": "Tucson, AZ", "rate": null, "status": "Paid" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let edited: LoadResponse = response.json().await.unwrap();
    assert_eq!(edited.delivery_location, "Tucson, AZ");
    assert_eq!(edited.rate, None);
    assert_eq!(edited.status, "Paid");
    assert_eq!(edited.empty_miles, load.empty_miles);
    assert_ne!(edited.loaded_miles, load.loaded_miles);

    let url = format!("{}/api/loads/{}", server.base_url, load.id);
    let response = client.delete(&url).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = client.delete(&url).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert!(week(&client, &server, "2025-06-11").await.loads.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn http_rejects_incomplete_load() {
    let mock = spawn_mock_store().await;
    let server = connected_server(&mock).await;
    let client = Client::new();

    let mut body = vegas_run();
    body["pickup_location"] = json!("  ");
    let response = client
        .post(format!("{}/api/loads", server.base_url))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.unwrap(), "Please fill in the pickup location.");

    let mut body = vegas_run();
    body["delivery_date"] = json!("2025-06-01");
    let response = client
        .post(format!("{}/api/loads", server.base_url))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .get(format!("{}/api/loads?week=%2B262142-12-31", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(mock.table.rows().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn http_setup_flow_connects_and_disconnects() {
    let mock = spawn_mock_store().await;
    let server = spawn_server(&[]).await;
    let client = Client::new();

    let page = client.get(&server.base_url).send().await.unwrap().text().await.unwrap();
    assert!(page.contains("Connect your database"));

    let response = client
        .get(format!("{}/api/loads", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = client
        .post(format!("{}/api/config", server.base_url))
        .json(&json!({ "url": "ftp://nowhere", "api_key": MOCK_KEY }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/api/config", server.base_url))
        .json(&json!({ "url": format!("{}/", mock.base_url), "api_key": MOCK_KEY }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let status: Value = response.json().await.unwrap();
    assert_eq!(status["configured"], true);
    assert_eq!(status["source"], "file");
    assert!(server.config_path.exists());

    let page = client.get(&server.base_url).send().await.unwrap().text().await.unwrap();
    assert!(page.contains("Weekly Report"));
    let response = client
        .get(format!("{}/api/loads/all", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let response = client
        .delete(format!("{}/api/config", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert!(!server.config_path.exists());

    let response = client
        .get(format!("{}/api/loads", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test(flavor = "multi_thread")]
async fn http_missing_table_has_its_own_message() {
    let mock = spawn_mock_store().await;
    let server = spawn_server(&[
        ("LOADS_STORE_URL", mock.base_url.as_str()),
        ("LOADS_STORE_KEY", MOCK_KEY),
        ("LOADS_STORE_TABLE", "trucks"),
    ])
    .await;
    let client = Client::new();

    let response = client
        .get(format!("{}/api/loads", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(response.text().await.unwrap().contains("table was not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn http_city_suggestions_and_mileage_preview() {
    let server = spawn_server(&[("LOADS_DEMO", "1")]).await;
    let client = Client::new();

    let cities: Value = client
        .get(format!("{}/api/cities?q=spring", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let suggestions = cities["suggestions"].as_array().unwrap();
    assert!(suggestions.iter().any(|c| c == "Springfield, MA"));
    assert!(suggestions.len() <= 7);

    let mileage: Value = client
        .get(format!("{}/api/mileage", server.base_url))
        .query(&[
            ("current", "Gotham, NJ"),
            ("pickup", "Las Vegas, NV"),
            ("delivery", "Phoenix, AZ"),
        ])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(mileage["empty_miles"].is_null());
    assert_eq!(mileage["total_miles"], mileage["loaded_miles"]);

    let all: Value = client
        .get(format!("{}/api/loads/all", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all["loads"].as_array().unwrap().len(), 3);
}
