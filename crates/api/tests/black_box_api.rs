use std::sync::Arc;

use regionhub_api::app::{self, AppServices};
use regionhub_infra::config::Settings;
use regionhub_infra::store::InMemoryRegionStore;
use regionhub_region::Region;
use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with_store(Arc::new(InMemoryRegionStore::new())).await
    }

    async fn spawn_with_store(store: Arc<InMemoryRegionStore>) -> Self {
        // Same router as prod, in-memory profile, bound to an ephemeral port.
        let services = AppServices::in_memory_with_store(&Settings::default(), store);
        let app = app::router(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn seeded(regions: &[(&str, &str)]) -> (Arc<InMemoryRegionStore>, Vec<Region>) {
    let regions: Vec<Region> = regions
        .iter()
        .map(|(code, name)| Region::create(code, name).unwrap())
        .collect();
    (Arc::new(InMemoryRegionStore::with_regions(regions.clone())), regions)
}

async fn get_by_code_eventually(client: &reqwest::Client, srv: &TestServer, code: &str) -> serde_json::Value {
    // Creation is asynchronous (queue + worker). Poll briefly until it lands.
    for _ in 0..50 {
        let res = client
            .get(srv.url(&format!("/region/get-by-ddd/{code}")))
            .send()
            .await
            .unwrap();

        if res.status() == StatusCode::OK {
            return res.json().await.unwrap();
        }

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    panic!("region {code} was not created within timeout");
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_is_accepted_then_visible_by_code_and_id() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/region"))
        .json(&json!({ "code": "11", "name": "SP" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "success": true, "error": "" }));

    let by_code = get_by_code_eventually(&client, &srv, "11").await;
    assert_eq!(by_code["success"], true);
    assert_eq!(by_code["data"]["name"], "SP");
    let id = by_code["data"]["id"].as_str().unwrap().to_string();

    let res = client
        .get(srv.url(&format!("/region/get-by-id/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let by_id: serde_json::Value = res.json().await.unwrap();
    assert_eq!(by_id["data"], json!({ "id": id, "code": "11", "name": "SP" }));
}

#[tokio::test]
async fn create_accepts_ddd_field_name() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/region"))
        .json(&json!({ "ddd": "21", "name": "RJ" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let by_code = get_by_code_eventually(&client, &srv, "21").await;
    assert_eq!(by_code["data"]["name"], "RJ");
}

#[tokio::test]
async fn create_with_taken_code_is_rejected() {
    let (store, _) = seeded(&[("11", "SP")]);
    let srv = TestServer::spawn_with_store(store.clone()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/region"))
        .json(&json!({ "code": "11", "name": "Sao Paulo" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "a region with this code already exists");
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn invalid_payloads_get_the_error_envelope() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for payload in [json!({ "code": "abc", "name": "SP" }), json!({ "code": "11", "name": "  " })] {
        let res = client.post(srv.url("/region")).json(&payload).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("validation failed"));
    }

    let res = client
        .post(srv.url("/region"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn get_all_orders_by_name_and_reports_paging() {
    let (store, _) = seeded(&[("11", "SP"), ("47", "SC")]);
    let srv = TestServer::spawn_with_store(store).await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/region/get-all")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["SC", "SP"]);
    assert_eq!(body["totalItems"], 2);
    assert_eq!(body["currentPage"], 0);
    assert_eq!(body["itemsPerPage"], 10);

    let res = client
        .get(srv.url("/region/get-all?pageSize=1&page=1"))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["name"], "SP");
    assert_eq!(body["totalItems"], 2);

    let res = client
        .get(srv.url("/region/get-all?page=-1"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_code_and_malformed_id_are_bad_requests() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/region/get-by-ddd/99")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "success": false, "error": "region not found" }));

    let res = client
        .get(srv.url("/region/get-by-id/not-a-uuid"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_overwrites_code_and_name() {
    let (store, regions) = seeded(&[("11", "SP")]);
    let srv = TestServer::spawn_with_store(store).await;
    let client = reqwest::Client::new();
    let id = regions[0].id_typed().to_string();

    let res = client
        .put(srv.url("/region"))
        .json(&json!({ "id": id, "code": "12", "name": "Sao Paulo" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let body = get_by_code_eventually(&client, &srv, "12").await;
    assert_eq!(body["data"], json!({ "id": id, "code": "12", "name": "Sao Paulo" }));

    let res = client
        .put(srv.url("/region"))
        .json(&json!({ "id": Region::create("13", "x").unwrap().id_typed().to_string(), "code": "13", "name": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_is_soft_and_idempotent() {
    let (store, regions) = seeded(&[("11", "SP"), ("47", "SC")]);
    let srv = TestServer::spawn_with_store(store.clone()).await;
    let client = reqwest::Client::new();
    let id = regions[0].id_typed().to_string();

    for _ in 0..2 {
        let res = client
            .delete(srv.url(&format!("/region/{id}")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }

    let body: serde_json::Value = client
        .get(srv.url("/region/get-all"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["totalItems"], 1);
    assert_eq!(body["data"][0]["name"], "SC");
    assert_eq!(store.len(), 2);

    let res = client
        .get(srv.url(&format!("/region/get-by-id/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "success": false, "error": "region not found" }));

    let unknown = Region::create("99", "x").unwrap().id_typed();
    let res = client
        .delete(srv.url(&format!("/region/{unknown}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
