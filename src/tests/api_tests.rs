use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;

use super::{eventually, harness, other_address, sample_tx, watched, Harness};
use crate::api::create_router;
use crate::config::Config;
use crate::db::transaction;
use crate::state::AppState;

async fn serve(h: &Harness) -> String {
    let state = Arc::new(AppState {
        config: Config::for_tests(),
        service: h.service.clone(),
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });

    base_url
}

#[tokio::test]
async fn wallet_management_over_http() {
    let h = harness().await;
    let base = serve(&h).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/track"))
        .query(&[("address", "not-an-address"), ("action", "add")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("valid Ethereum"));

    let response = client
        .post(format!("{base}/track"))
        .query(&[("address", other_address('1').as_str()), ("action", "watch")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    for _ in 0..2 {
        let response = client
            .post(format!("{base}/track"))
            .query(&[("address", watched().as_str()), ("action", "add")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = client.get(format!("{base}/wallets")).send().await.unwrap();
    assert_eq!(response.headers()["x-total-count"], "1");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"][0]["address"], watched().to_lowercase());

    let response = client
        .post(format!("{base}/track"))
        .query(&[("address", other_address('9').as_str()), ("action", "remove")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["removed"], false);
}

#[tokio::test]
async fn monitoring_and_transactions_over_http() {
    let h = harness().await;
    let base = serve(&h).await;
    let client = reqwest::Client::new();

    // Nothing to watch yet
    let body: Value = client
        .post(format!("{base}/monitoring/toggle"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["outcome"], "no_addresses");
    assert_eq!(body["data"]["status"]["running"], false);

    h.service.add_wallet(&watched()).await.unwrap();

    let body: Value = client
        .post(format!("{base}/monitoring/start"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["outcome"], "started");
    assert_eq!(body["data"]["status"]["provider"], "bloxroute");

    let feed = h.feed.clone();
    eventually("subscription", || {
        let feed = feed.clone();
        async move { feed.subscriptions() == 1 }
    })
    .await;

    h.feed.push(Ok(sample_tx("0x01", &watched(), None)));
    h.feed.push(Ok(sample_tx("0x02", &other_address('1'), Some(&watched()))));
    let pool = &h.pool;
    eventually("two stored transactions", || async move {
        transaction::count_transactions(pool).await.unwrap() == 2
    })
    .await;

    let response = client.get(format!("{base}/transactions")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-total-count"], "2");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"][0]["hash"], "0x02");
    assert_eq!(body["data"][1]["hash"], "0x01");

    let body: Value = client
        .get(format!("{base}/monitoring"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["running"], true);
    assert_eq!(body["data"]["stored"], 2);

    let body: Value = client
        .post(format!("{base}/monitoring/stop"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["outcome"], "stopped");
    assert_eq!(body["data"]["status"]["running"], false);
    assert_eq!(h.feed.open_connections(), 0);
}
