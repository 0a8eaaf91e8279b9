//! Conversions between CRI messages and runtime types.

use podlite_shared::cri;
use podlite_shared::{PodliteError, PodliteResult};

use crate::runtime::types::{
    ContainerFilter, ContainerMetadata, ContainerRecord, ContainerRequest, ContainerState,
    ImageRecord, SandboxFilter, SandboxMetadata, SandboxRecord, SandboxRequest, SandboxState,
};

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

// ============================================================================
// REQUESTS
// ============================================================================

pub fn sandbox_request(req: cri::RunPodSandboxRequest) -> PodliteResult<SandboxRequest> {
    let config = req
        .config
        .ok_or_else(|| PodliteError::InvalidArgument("sandbox config is required".into()))?;
    let metadata = config
        .metadata
        .ok_or_else(|| PodliteError::InvalidArgument("sandbox metadata is required".into()))?;

    Ok(SandboxRequest {
        metadata: SandboxMetadata {
            name: metadata.name,
            namespace: metadata.namespace,
            uid: metadata.uid,
            attempt: metadata.attempt,
        },
        labels: config.labels,
        annotations: config.annotations,
        runtime_handler: req.runtime_handler,
    })
}

pub fn container_request(req: cri::CreateContainerRequest) -> PodliteResult<ContainerRequest> {
    let config = req
        .config
        .ok_or_else(|| PodliteError::InvalidArgument("container config is required".into()))?;
    let metadata = config
        .metadata
        .ok_or_else(|| PodliteError::InvalidArgument("container metadata is required".into()))?;
    let image = config
        .image
        .and_then(|spec| non_empty(spec.image))
        .ok_or_else(|| PodliteError::InvalidArgument("container image is required".into()))?;

    Ok(ContainerRequest {
        pod_sandbox_id: req.pod_sandbox_id,
        metadata: ContainerMetadata {
            name: metadata.name,
            attempt: metadata.attempt,
        },
        image,
        labels: config.labels,
        annotations: config.annotations,
        log_path: config.log_path,
    })
}

/// Image reference of an `ImageSpec`, which must be present and non-empty.
pub fn image_reference(spec: Option<cri::ImageSpec>) -> PodliteResult<String> {
    spec.and_then(|spec| non_empty(spec.image))
        .ok_or_else(|| PodliteError::InvalidArgument("image reference is required".into()))
}

// ============================================================================
// FILTERS
// ============================================================================

pub fn sandbox_filter(filter: Option<cri::PodSandboxFilter>) -> PodliteResult<SandboxFilter> {
    let Some(filter) = filter else {
        return Ok(SandboxFilter::default());
    };
    let state = filter
        .state
        .map(|value| sandbox_state_from_proto(value.state))
        .transpose()?;

    Ok(SandboxFilter {
        id: non_empty(filter.id),
        state,
        label_selector: filter.label_selector,
    })
}

pub fn container_filter(filter: Option<cri::ContainerFilter>) -> PodliteResult<ContainerFilter> {
    let Some(filter) = filter else {
        return Ok(ContainerFilter::default());
    };
    let state = filter
        .state
        .map(|value| container_state_from_proto(value.state))
        .transpose()?;

    Ok(ContainerFilter {
        id: non_empty(filter.id),
        state,
        pod_sandbox_id: non_empty(filter.pod_sandbox_id),
        label_selector: filter.label_selector,
    })
}

/// Exact reference to filter images on, if any.
pub fn image_filter(filter: Option<cri::ImageFilter>) -> Option<String> {
    filter
        .and_then(|filter| filter.image)
        .and_then(|spec| non_empty(spec.image))
}

// ============================================================================
// STATES
// ============================================================================

pub fn sandbox_state_to_proto(state: SandboxState) -> i32 {
    match state {
        SandboxState::Ready => cri::PodSandboxState::SandboxReady as i32,
        SandboxState::NotReady => cri::PodSandboxState::SandboxNotready as i32,
    }
}

fn sandbox_state_from_proto(value: i32) -> PodliteResult<SandboxState> {
    match cri::PodSandboxState::try_from(value) {
        Ok(cri::PodSandboxState::SandboxReady) => Ok(SandboxState::Ready),
        Ok(cri::PodSandboxState::SandboxNotready) => Ok(SandboxState::NotReady),
        Err(_) => Err(PodliteError::InvalidArgument(format!(
            "unknown pod sandbox state {}",
            value
        ))),
    }
}

pub fn container_state_to_proto(state: ContainerState) -> i32 {
    match state {
        ContainerState::Created => cri::ContainerState::ContainerCreated as i32,
        ContainerState::Running => cri::ContainerState::ContainerRunning as i32,
        ContainerState::Exited => cri::ContainerState::ContainerExited as i32,
        ContainerState::Unknown => cri::ContainerState::ContainerUnknown as i32,
    }
}

fn container_state_from_proto(value: i32) -> PodliteResult<ContainerState> {
    match cri::ContainerState::try_from(value) {
        Ok(cri::ContainerState::ContainerCreated) => Ok(ContainerState::Created),
        Ok(cri::ContainerState::ContainerRunning) => Ok(ContainerState::Running),
        Ok(cri::ContainerState::ContainerExited) => Ok(ContainerState::Exited),
        Ok(cri::ContainerState::ContainerUnknown) => Ok(ContainerState::Unknown),
        Err(_) => Err(PodliteError::InvalidArgument(format!(
            "unknown container state {}",
            value
        ))),
    }
}

// ============================================================================
// RECORDS
// ============================================================================

fn sandbox_metadata(metadata: &SandboxMetadata) -> cri::PodSandboxMetadata {
    cri::PodSandboxMetadata {
        name: metadata.name.clone(),
        uid: metadata.uid.clone(),
        namespace: metadata.namespace.clone(),
        attempt: metadata.attempt,
    }
}

fn container_metadata(metadata: &ContainerMetadata) -> cri::ContainerMetadata {
    cri::ContainerMetadata {
        name: metadata.name.clone(),
        attempt: metadata.attempt,
    }
}

fn image_spec(reference: &str) -> cri::ImageSpec {
    cri::ImageSpec {
        image: reference.to_string(),
        ..Default::default()
    }
}

pub fn pod_sandbox(record: &SandboxRecord) -> cri::PodSandbox {
    cri::PodSandbox {
        id: record.id.clone(),
        metadata: Some(sandbox_metadata(&record.metadata)),
        state: sandbox_state_to_proto(record.state),
        created_at: record.created_at,
        labels: record.labels.clone(),
        annotations: record.annotations.clone(),
        runtime_handler: record.runtime_handler.clone(),
    }
}

pub fn pod_sandbox_status(record: &SandboxRecord) -> cri::PodSandboxStatus {
    cri::PodSandboxStatus {
        id: record.id.clone(),
        metadata: Some(sandbox_metadata(&record.metadata)),
        state: sandbox_state_to_proto(record.state),
        created_at: record.created_at,
        labels: record.labels.clone(),
        annotations: record.annotations.clone(),
        runtime_handler: record.runtime_handler.clone(),
    }
}

pub fn container(record: &ContainerRecord) -> cri::Container {
    cri::Container {
        id: record.id.clone(),
        pod_sandbox_id: record.pod_sandbox_id.clone(),
        metadata: Some(container_metadata(&record.metadata)),
        image: Some(image_spec(&record.image)),
        image_ref: record.image_ref.clone(),
        state: container_state_to_proto(record.state),
        created_at: record.created_at,
        labels: record.labels.clone(),
        annotations: record.annotations.clone(),
    }
}

/// Containers run as soon as they are created, so `started_at` equals `created_at`.
pub fn container_status(record: &ContainerRecord) -> cri::ContainerStatus {
    cri::ContainerStatus {
        id: record.id.clone(),
        metadata: Some(container_metadata(&record.metadata)),
        state: container_state_to_proto(record.state),
        created_at: record.created_at,
        started_at: record.created_at,
        image: Some(image_spec(&record.image)),
        image_ref: record.image_ref.clone(),
        labels: record.labels.clone(),
        annotations: record.annotations.clone(),
        log_path: record.log_path.clone(),
        ..Default::default()
    }
}

pub fn image(record: &ImageRecord) -> cri::Image {
    cri::Image {
        id: record.id.clone(),
        repo_tags: vec![record.spec.clone()],
        size: record.size,
        spec: Some(image_spec(&record.spec)),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_sandbox_request_requires_metadata() {
        let err = sandbox_request(cri::RunPodSandboxRequest {
            config: Some(cri::PodSandboxConfig::default()),
            runtime_handler: String::new(),
        })
        .unwrap_err();
        assert!(matches!(err, PodliteError::InvalidArgument(_)));
    }

    #[test]
    fn test_sandbox_request_carries_labels() {
        let request = sandbox_request(cri::RunPodSandboxRequest {
            config: Some(cri::PodSandboxConfig {
                metadata: Some(cri::PodSandboxMetadata {
                    name: "web".into(),
                    namespace: "default".into(),
                    uid: "uid-1".into(),
                    attempt: 2,
                }),
                labels: HashMap::from([("app".to_string(), "web".to_string())]),
                ..Default::default()
            }),
            runtime_handler: "runc".into(),
        })
        .unwrap();

        assert_eq!(request.id(), "default-web-sandbox");
        assert_eq!(request.metadata.attempt, 2);
        assert_eq!(request.labels["app"], "web");
        assert_eq!(request.runtime_handler, "runc");
    }

    #[test]
    fn test_container_request_requires_image() {
        let err = container_request(cri::CreateContainerRequest {
            pod_sandbox_id: "default-web-sandbox".into(),
            config: Some(cri::ContainerConfig {
                metadata: Some(cri::ContainerMetadata {
                    name: "app".into(),
                    attempt: 0,
                }),
                image: Some(cri::ImageSpec::default()),
                ..Default::default()
            }),
            sandbox_config: None,
        })
        .unwrap_err();
        assert!(matches!(err, PodliteError::InvalidArgument(_)));
    }

    #[test]
    fn test_empty_filter_fields_match_everything() {
        let filter = container_filter(Some(cri::ContainerFilter::default())).unwrap();
        assert!(filter.id.is_none());
        assert!(filter.pod_sandbox_id.is_none());
        assert!(filter.state.is_none());

        assert!(image_filter(Some(cri::ImageFilter { image: None })).is_none());
    }

    #[test]
    fn test_filter_state_is_converted() {
        let filter = sandbox_filter(Some(cri::PodSandboxFilter {
            state: Some(cri::PodSandboxStateValue {
                state: cri::PodSandboxState::SandboxNotready as i32,
            }),
            ..Default::default()
        }))
        .unwrap();
        assert_eq!(filter.state, Some(SandboxState::NotReady));

        let err = container_filter(Some(cri::ContainerFilter {
            state: Some(cri::ContainerStateValue { state: 42 }),
            ..Default::default()
        }))
        .unwrap_err();
        assert!(matches!(err, PodliteError::InvalidArgument(_)));
    }

    #[test]
    fn test_state_values_match_protocol() {
        assert_eq!(sandbox_state_to_proto(SandboxState::Ready), 0);
        assert_eq!(container_state_to_proto(ContainerState::Running), 1);
    }

    #[test]
    fn test_image_descriptor() {
        let proto = image(&ImageRecord {
            id: "example.com/app:1".into(),
            spec: "example.com/app:1".into(),
            size: 1024,
        });
        assert_eq!(proto.id, "example.com/app:1");
        assert_eq!(proto.repo_tags, vec!["example.com/app:1"]);
        assert_eq!(proto.size, 1024);
        assert_eq!(proto.spec.unwrap().image, "example.com/app:1");
    }
}
