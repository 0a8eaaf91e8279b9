//! Repeated and concurrent create requests.

mod common;

use common::{FakeRuntime, Harness};
use podlite::runtime::types::{ContainerRequest, SandboxRequest};

#[tokio::test]
async fn test_run_pod_sandbox_twice_creates_once() {
    let harness = Harness::new();

    let first = harness
        .runtime
        .run_pod_sandbox(SandboxRequest::new("default", "web"))
        .await
        .unwrap();
    let second = harness
        .runtime
        .run_pod_sandbox(SandboxRequest::new("default", "web"))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(harness.engine.run_ids(), vec!["default-web-sandbox"]);
    assert_eq!(harness.unpacker.destinations().len(), 1);
    assert_eq!(
        harness
            .runtime
            .list_pod_sandboxes(&Default::default())
            .len(),
        1
    );
    assert_eq!(harness.runtime.metrics().sandboxes_created_total(), 1);
}

#[tokio::test]
async fn test_concurrent_run_pod_sandbox_creates_once() {
    let harness = Harness::new();

    let requests = (0..8).map(|_| {
        let runtime = harness.runtime.clone();
        tokio::spawn(async move {
            runtime
                .run_pod_sandbox(SandboxRequest::new("default", "web"))
                .await
        })
    });
    let ids: Vec<String> = futures::future::join_all(requests)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert!(ids.iter().all(|id| id == "default-web-sandbox"));
    assert_eq!(harness.engine.run_ids().len(), 1);
    assert_eq!(harness.unpacker.destinations().len(), 1);
}

#[tokio::test]
async fn test_concurrent_create_container_creates_once() {
    let harness = Harness::new();
    let sandbox = harness
        .runtime
        .run_pod_sandbox(SandboxRequest::new("default", "web"))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        harness
            .runtime
            .create_container(ContainerRequest::new(&sandbox, "app", "example.com/app:1")),
        harness
            .runtime
            .create_container(ContainerRequest::new(&sandbox, "app", "example.com/app:1")),
    );

    assert_eq!(a.unwrap(), "default-web-sandbox-app");
    assert_eq!(b.unwrap(), "default-web-sandbox-app");
    assert_eq!(harness.puller.references(), vec!["example.com/app:1"]);
    assert_eq!(
        harness.engine.run_ids(),
        vec!["default-web-sandbox", "default-web-sandbox-app"]
    );
    assert_eq!(harness.runtime.metrics().containers_created_total(), 1);
}

#[tokio::test]
async fn test_containers_share_one_pull_but_unpack_separately() {
    let harness = Harness::new();
    let sandbox = harness
        .runtime
        .run_pod_sandbox(SandboxRequest::new("default", "web"))
        .await
        .unwrap();

    for name in ["app", "worker"] {
        harness
            .runtime
            .create_container(ContainerRequest::new(&sandbox, name, "example.com/app:1"))
            .await
            .unwrap();
    }

    assert_eq!(harness.puller.references().len(), 1);
    let destinations = harness.unpacker.destinations();
    assert_eq!(destinations.len(), 3);
    assert!(destinations.contains(&harness.bundle("default-web-sandbox-app")));
    assert!(destinations.contains(&harness.bundle("default-web-sandbox-worker")));
}

#[tokio::test]
async fn test_retry_after_failure_reuses_bundle() {
    let harness = Harness::new();
    let sandbox = harness
        .runtime
        .run_pod_sandbox(SandboxRequest::new("default", "web"))
        .await
        .unwrap();
    harness.engine.fail_run_of("default-web-sandbox-app");

    let request = ContainerRequest::new(&sandbox, "app", "example.com/app:1");
    assert!(harness.runtime.create_container(request.clone()).await.is_err());

    harness.engine.fail_runs.lock().clear();
    let id = harness.runtime.create_container(request).await.unwrap();

    assert_eq!(id, "default-web-sandbox-app");
    // Pull and unpack are not repeated on retry.
    assert_eq!(harness.puller.references().len(), 1);
    assert_eq!(harness.unpacker.destinations().len(), 2);
}

#[tokio::test]
async fn test_retry_after_pid_query_failure_reuses_bundle() {
    let harness = Harness::new();
    let request = ContainerRequest::new("default-web-sandbox", "app", "example.com/app:1");

    // The sandbox is not running yet, so the PID query fails after the unpack.
    assert!(harness.runtime.create_container(request.clone()).await.is_err());
    let bundle = harness.bundle("default-web-sandbox-app");
    assert!(bundle.join("config.json").exists());

    harness
        .runtime
        .run_pod_sandbox(SandboxRequest::new("default", "web"))
        .await
        .unwrap();
    let id = harness.runtime.create_container(request).await.unwrap();

    assert_eq!(id, "default-web-sandbox-app");
    let container_unpacks = harness
        .unpacker
        .destinations()
        .into_iter()
        .filter(|d| *d == bundle)
        .count();
    assert_eq!(container_unpacks, 1);
    assert!(harness.engine.run_ids().contains(&id));
}

#[tokio::test]
async fn test_retry_after_interrupted_unpack_unpacks_again() {
    let harness = Harness::new();
    let sandbox = harness
        .runtime
        .run_pod_sandbox(SandboxRequest::new("default", "web"))
        .await
        .unwrap();
    let bundle = harness.bundle("default-web-sandbox-app");
    harness.unpacker.interrupt_next(bundle.clone());

    let request = ContainerRequest::new(&sandbox, "app", "example.com/app:1");
    assert!(harness.runtime.create_container(request.clone()).await.is_err());
    assert!(bundle.join("rootfs").exists());
    assert!(!bundle.join("config.json").exists());

    let id = harness.runtime.create_container(request).await.unwrap();

    assert_eq!(id, "default-web-sandbox-app");
    assert!(bundle.join("config.json").exists());
    assert_eq!(
        harness.load_spec(&id).process().as_ref().unwrap().terminal(),
        Some(false)
    );
}

#[tokio::test]
async fn test_sandbox_image_is_pulled_once_at_startup() {
    let harness = Harness::new();

    harness.runtime.ensure_sandbox_image().await.unwrap();
    harness.runtime.ensure_sandbox_image().await.unwrap();

    assert_eq!(harness.puller.references(), vec!["registry.k8s.io/pause:3.9"]);
    assert!(harness.runtime.image_status("registry.k8s.io/pause:3.9").is_some());
}

#[tokio::test]
async fn test_reconcile_reports_vanished_instances() {
    // Report our own PID so live instances pass the liveness check.
    let harness = Harness::with_engine(FakeRuntime::with_pid(std::process::id()));
    let sandbox = harness
        .runtime
        .run_pod_sandbox(SandboxRequest::new("default", "web"))
        .await
        .unwrap();
    harness
        .runtime
        .create_container(ContainerRequest::new(&sandbox, "app", "example.com/app:1"))
        .await
        .unwrap();

    assert!(harness.runtime.reconcile().await.is_empty());

    harness.engine.forget("default-web-sandbox-app");
    let drifted = harness.runtime.reconcile().await;

    assert_eq!(drifted, vec!["default-web-sandbox-app"]);
    // Drift is reported, not repaired.
    assert!(harness.runtime.container_status("default-web-sandbox-app").is_ok());
}
