//! Trait contract tests for the gateway resources.
//!
//! These tests verify the behavioral contracts of the resource traits
//! using the in-memory fake. Any conforming implementation must pass these.

use std::sync::Arc;
use std::time::Duration;

use release_gateway::fakes::{FakeOp, GatewayCall, MemoryGateway};
use release_gateway::*;
use serde_json::json;

fn file(name: &str) -> FileDescriptor {
    FileDescriptor::new(name, format!("/files/{}", name))
}

// ===========================================================================
// ReleaseResource
// ===========================================================================

#[tokio::test]
async fn retrieve_returns_registered_payload() {
    let gateway = MemoryGateway::new();
    gateway.insert_release("abc123", "1.0.0", json!({"version_number": "1.0.0"}));

    let payload = gateway.retrieve("abc123", "1.0.0").await.unwrap();

    assert_eq!(payload["version_number"], "1.0.0");
}

#[tokio::test]
async fn retrieve_unknown_release_is_not_found() {
    let gateway = MemoryGateway::new();
    let err = gateway.retrieve("missing", "1.0.0").await.unwrap_err();

    assert!(matches!(err, GatewayError::NotFound(_)));
}

// ===========================================================================
// FileListingResource
// ===========================================================================

#[tokio::test]
async fn list_is_scoped_by_category() {
    let gateway = MemoryGateway::new();
    gateway.insert_files("abc123", "1.0.0", FileCategory::Code, vec![file("main.py")]);
    gateway.insert_files("abc123", "1.0.0", FileCategory::Data, vec![file("input.csv")]);

    let code = FileListingResource::list(&gateway, "abc123", "1.0.0", FileCategory::Code)
        .await
        .unwrap();
    let docs = FileListingResource::list(&gateway, "abc123", "1.0.0", FileCategory::Docs)
        .await
        .unwrap();

    assert_eq!(code, vec![file("main.py")]);
    assert!(docs.is_empty());
}

#[tokio::test]
async fn delete_removes_file_from_listing() {
    let gateway = MemoryGateway::new();
    gateway.insert_files(
        "abc123",
        "1.0.0",
        FileCategory::Code,
        vec![file("main.py"), file("util.py")],
    );

    gateway.delete("/files/main.py").await.unwrap();
    let code = FileListingResource::list(&gateway, "abc123", "1.0.0", FileCategory::Code)
        .await
        .unwrap();

    assert_eq!(code, vec![file("util.py")]);
}

#[tokio::test]
async fn delete_unknown_path_is_not_found() {
    let gateway = MemoryGateway::new();
    let err = gateway.delete("/files/ghost.py").await.unwrap_err();

    assert!(matches!(err, GatewayError::NotFound(_)));
}

#[tokio::test]
async fn clear_category_empties_only_that_category() {
    let gateway = MemoryGateway::new();
    gateway.insert_files("abc123", "1.0.0", FileCategory::Code, vec![file("main.py")]);
    gateway.insert_files("abc123", "1.0.0", FileCategory::Docs, vec![file("README.md")]);

    gateway
        .clear_category("abc123", "1.0.0", FileCategory::Code)
        .await
        .unwrap();

    let code = FileListingResource::list(&gateway, "abc123", "1.0.0", FileCategory::Code)
        .await
        .unwrap();
    let docs = FileListingResource::list(&gateway, "abc123", "1.0.0", FileCategory::Docs)
        .await
        .unwrap();
    assert!(code.is_empty());
    assert_eq!(docs, vec![file("README.md")]);
}

#[tokio::test]
async fn scripted_failure_applies_once() {
    let gateway = MemoryGateway::new();
    gateway.fail_next(
        FakeOp::ListFiles(FileCategory::Data),
        GatewayError::Rejected("boom".to_string()),
    );

    let first = FileListingResource::list(&gateway, "abc123", "1.0.0", FileCategory::Data).await;
    let second = FileListingResource::list(&gateway, "abc123", "1.0.0", FileCategory::Data).await;

    assert!(first.is_err());
    assert!(second.is_ok());
}

#[tokio::test(start_paused = true)]
async fn scripted_listings_resolve_by_delay_not_issue_order() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.script_listing(
        FileCategory::Data,
        Duration::from_millis(300),
        Ok(vec![file("old.csv")]),
    );
    gateway.script_listing(
        FileCategory::Data,
        Duration::from_millis(10),
        Ok(vec![file("new.csv")]),
    );

    let slow = {
        let gateway = Arc::clone(&gateway);
        tokio::spawn(async move {
            FileListingResource::list(gateway.as_ref(), "abc123", "1.0.0", FileCategory::Data).await
        })
    };
    tokio::task::yield_now().await;
    let fast = FileListingResource::list(gateway.as_ref(), "abc123", "1.0.0", FileCategory::Data)
        .await
        .unwrap();

    assert_eq!(fast, vec![file("new.csv")]);
    assert_eq!(slow.await.unwrap().unwrap(), vec![file("old.csv")]);
}

// ===========================================================================
// MediaResource / ProfileImageUpload
// ===========================================================================

#[tokio::test]
async fn media_list_returns_registered_media() {
    let gateway = MemoryGateway::new();
    gateway.insert_media("abc123", vec![MediaDescriptor::new("shot.png", "/media/shot.png")]);

    let media = MediaResource::list(&gateway, "abc123").await.unwrap();

    assert_eq!(media.len(), 1);
    assert_eq!(media[0].name, "shot.png");
}

#[tokio::test]
async fn upload_stores_bytes_and_returns_reference() {
    let gateway = MemoryGateway::new();
    let reference = gateway.upload("u-1", vec![1, 2, 3]).await.unwrap();

    assert!(reference.contains("u-1"));
    assert_eq!(gateway.uploaded("u-1"), Some(vec![1, 2, 3]));
    assert_eq!(
        gateway.calls(),
        vec![GatewayCall::Upload {
            user_key: "u-1".to_string(),
            bytes: 3
        }]
    );
}
