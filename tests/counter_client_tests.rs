// SPDX-License-Identifier: MIT

//! Tests for the low-level counter service client.

use geoviews::services::CounterClient;
use serde_json::json;
use std::sync::atomic::Ordering;

mod common;
use common::spawn_stub;

#[tokio::test]
async fn test_fetch_count() {
    let (base_url, stub) = spawn_stub().await;
    stub.set_count("ns", "home", 42);

    let client = CounterClient::new(&base_url);
    let response = client.fetch_count("ns", "home").await.unwrap();
    assert_eq!(response.count, Some(42));
}

#[tokio::test]
async fn test_fetch_count_unknown_page_is_zero() {
    let (base_url, _stub) = spawn_stub().await;

    let client = CounterClient::new(&base_url);
    let response = client.fetch_count("ns", "never-seen").await.unwrap();
    assert_eq!(response.count, Some(0));
}

#[tokio::test]
async fn test_fetch_count_server_error() {
    let (base_url, stub) = spawn_stub().await;
    stub.fail_all.store(true, Ordering::SeqCst);

    let client = CounterClient::new(&base_url);
    let err = client.fetch_count("ns", "home").await.unwrap_err();
    assert!(!err.is_auth_error());
}

#[tokio::test]
async fn test_register_hit_increments_and_reports_unique() {
    let (base_url, stub) = spawn_stub().await;
    let client = CounterClient::new(&base_url);

    let first = client.register_hit("ns", "home").await.unwrap();
    assert_eq!(first.count, Some(1));
    assert!(first.unique);

    stub.hit_unique.store(false, Ordering::SeqCst);
    let second = client.register_hit("ns", "home").await.unwrap();
    assert_eq!(second.count, Some(2));
    assert!(!second.unique);
}

#[tokio::test]
async fn test_query_values_are_percent_encoded() {
    let (base_url, stub) = spawn_stub().await;
    stub.set_count("my ns", "a&b", 7);

    let client = CounterClient::new(&base_url);
    let response = client.fetch_count("my ns", "a&b").await.unwrap();
    assert_eq!(response.count, Some(7));
}

#[tokio::test]
async fn test_login_success() {
    let (base_url, stub) = spawn_stub().await;
    let client = CounterClient::new(&base_url);

    let response = client.login("open-sesame").await.unwrap();
    assert_eq!(response.token, "stub-token");
    assert_eq!(response.expires_at, *stub.expires_at.lock().unwrap());
}

#[tokio::test]
async fn test_login_bad_password() {
    let (base_url, _stub) = spawn_stub().await;
    let client = CounterClient::new(&base_url);

    let err = client.login("wrong").await.unwrap_err();
    // A login rejection is an auth error, not a generic API failure.
    assert!(err.is_auth_error());
}

#[tokio::test]
async fn test_fetch_views_with_valid_token() {
    let (base_url, stub) = spawn_stub().await;
    stub.set_views(vec![json!({"ip": "1.2.3.4", "lat": 10.0, "lon": 20.0})]);

    let client = CounterClient::new(&base_url);
    let data = client.fetch_views("ns", "home", "stub-token").await.unwrap();
    assert_eq!(data.namespace.as_deref(), Some("ns"));
    assert_eq!(data.views.len(), 1);
}

#[tokio::test]
async fn test_fetch_views_rejects_bad_token() {
    let (base_url, _stub) = spawn_stub().await;
    let client = CounterClient::new(&base_url);

    let err = client
        .fetch_views("ns", "home", "not-the-token")
        .await
        .unwrap_err();
    assert!(err.is_auth_error());
}
