mod common;

use anyhow::Result;
use axum::{extract::Query, routing::get, Json, Router};
use common::{key_bytes, FailingService, FixedService};
use nabu_vault::entropy::KeyProvenance;
use nabu_vault::{EntropySource, QrngClient, RandomnessService};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_valid_remote_response_is_used_verbatim() {
    let service = FixedService::new(key_bytes());
    let source = EntropySource::new(service.clone());

    let (bytes, provenance) = source.fetch_with_provenance(32, 3).await;

    let expected: Vec<u8> = key_bytes().into_iter().map(|v| v as u8).collect();
    assert_eq!(bytes, expected);
    assert_eq!(provenance, KeyProvenance::Remote);
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn test_unreachable_service_falls_back_after_all_retries() {
    let service = FailingService::new();
    let source = EntropySource::new(service.clone());

    let (first, provenance) = source.fetch_with_provenance(16, 3).await;
    let second = source.fetch(16, 3).await;

    assert_eq!(provenance, KeyProvenance::LocalFallback);
    assert_eq!(first.len(), 16);
    assert_eq!(second.len(), 16);
    assert_ne!(first, second);
    assert_eq!(service.calls(), 6);
}

#[tokio::test]
async fn test_short_response_is_rejected() {
    let service = FixedService::new(vec![1, 2, 3]);
    let source = EntropySource::new(service.clone());

    let (bytes, provenance) = source.fetch_with_provenance(32, 2).await;

    assert_eq!(bytes.len(), 32);
    assert_eq!(provenance, KeyProvenance::LocalFallback);
    assert_eq!(service.calls(), 2);
}

#[tokio::test]
async fn test_out_of_range_values_are_rejected() {
    let mut data = key_bytes();
    data[5] = 256;
    let service = FixedService::new(data);

    let (bytes, provenance) = EntropySource::new(service).fetch_with_provenance(32, 1).await;

    assert_eq!(bytes.len(), 32);
    assert_eq!(provenance, KeyProvenance::LocalFallback);
}

#[tokio::test]
async fn test_unsuccessful_flag_is_rejected() {
    let service = Arc::new(FixedService {
        success: false,
        data: key_bytes(),
        calls: Default::default(),
    });

    let (_, provenance) = EntropySource::new(service.clone())
        .fetch_with_provenance(32, 3)
        .await;

    assert_eq!(provenance, KeyProvenance::LocalFallback);
    assert_eq!(service.calls(), 3);
}

#[tokio::test]
async fn test_zero_retries_goes_straight_to_local() {
    let service = FixedService::new(key_bytes());

    let (bytes, provenance) = EntropySource::new(service.clone())
        .fetch_with_provenance(32, 0)
        .await;

    assert_eq!(bytes.len(), 32);
    assert_eq!(provenance, KeyProvenance::LocalFallback);
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_zero_size_is_empty() {
    let service = FixedService::new(key_bytes());

    let bytes = EntropySource::new(service.clone()).fetch(0, 3).await;

    assert!(bytes.is_empty());
    assert_eq!(service.calls(), 0);
}

/// Serves the ANU JSON API shape on a loopback port
async fn spawn_qrng_stub() -> Result<String> {
    async fn handler(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
        let length: usize = params
            .get("length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let kind_ok = params.get("type").map(String::as_str) == Some("uint8");

        let data: Vec<u32> = (0..length as u32).map(|i| (i * 3) % 256).collect();
        Json(json!({ "type": "uint8", "length": length, "data": data, "success": kind_ok }))
    }

    let app = Router::new().route("/API/jsonI.php", get(handler));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(format!("http://{}/API/jsonI.php", addr))
}

#[tokio::test]
async fn test_qrng_client_against_stub() -> Result<()> {
    let endpoint = spawn_qrng_stub().await?;
    let client = QrngClient::new(endpoint, Duration::from_secs(5))?;

    let response = client.request(8).await?;
    assert!(response.success);
    assert_eq!(response.data, vec![0, 3, 6, 9, 12, 15, 18, 21]);

    let source = EntropySource::new(Arc::new(client));
    let (bytes, provenance) = source.fetch_with_provenance(32, 3).await;

    assert_eq!(provenance, KeyProvenance::Remote);
    assert_eq!(&bytes[..4], &[0u8, 3, 6, 9]);

    Ok(())
}

#[tokio::test]
async fn test_qrng_client_http_error_falls_back() -> Result<()> {
    let endpoint = spawn_qrng_stub().await?;
    let missing = endpoint.replace("jsonI.php", "missing");
    let client = QrngClient::new(missing, Duration::from_secs(5))?;

    assert!(client.request(8).await.is_err());

    let (bytes, provenance) = EntropySource::new(Arc::new(client))
        .fetch_with_provenance(32, 2)
        .await;
    assert_eq!(bytes.len(), 32);
    assert_eq!(provenance, KeyProvenance::LocalFallback);

    Ok(())
}
