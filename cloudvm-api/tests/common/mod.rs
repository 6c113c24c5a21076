// Common test utilities and fixtures
#![allow(dead_code)]

use axum::Router;
use axum_test::TestServer;
use cloudvm_api::app::{create_cors, AppState};
use cloudvm_api::routes::create_router;
use cloudvm_api::{ProvisioningService, StorageFailurePolicy, VmRepository};
use cloudvm_providers::ProviderFactory;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

/// Test application backed by a store in a fresh temp directory.
/// Keep the returned `TempDir` alive for the duration of the test.
pub async fn create_test_app(policy: StorageFailurePolicy) -> (Router, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let repository = VmRepository::open(dir.path().join("vm_storage.json"), policy)
        .await
        .expect("Failed to open test VM store");
    let service = ProvisioningService::new(Arc::new(ProviderFactory::new()), repository);
    let state = AppState::new(Arc::new(service));
    let app = create_router().layer(create_cors()).with_state(state);
    (app, dir)
}

pub async fn create_test_server() -> (TestServer, TempDir) {
    let (app, dir) = create_test_app(StorageFailurePolicy::Degrade).await;
    (TestServer::new(app).unwrap(), dir)
}

pub fn aws_request() -> Value {
    json!({
        "provider_type": "aws",
        "parameters": {
            "instance_type": "t2.micro",
            "region": "us-east-1",
            "vpc": "vpc-1",
            "ami": "ami-1"
        }
    })
}

pub fn azure_request() -> Value {
    json!({
        "provider_type": "azure",
        "parameters": {
            "vm_size": "Standard_B1s",
            "resource_group": "rg-1",
            "location": "eastus",
            "api_key": "abc123"
        }
    })
}

pub fn gcp_request() -> Value {
    json!({
        "provider_type": "gcp",
        "parameters": {
            "machine_type": "n1-standard-1",
            "zone": "us-central1-a",
            "project_id": "proj-123"
        }
    })
}

/// Provision through the API and return the new VM id.
pub async fn provision(server: &TestServer, body: &Value) -> String {
    let response = server.post("/api/v1/vm/provision").json(body).await;
    assert_eq!(response.status_code(), 200);
    let result: Value = response.json();
    assert_eq!(result["status"], "success", "unexpected result: {result}");
    result["vm_id"].as_str().expect("vm_id").to_string()
}
