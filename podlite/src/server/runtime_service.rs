//! CRI `RuntimeService`.

use podlite_shared::cri;
use podlite_shared::cri::runtime_service_server::RuntimeService;
use tonic::{Request, Response, Status};

use super::convert;
use crate::runtime::PodliteRuntime;
use crate::runtime::constants::{conditions, version};

#[derive(Debug, Clone)]
pub struct CriRuntimeService {
    runtime: PodliteRuntime,
}

impl CriRuntimeService {
    pub fn new(runtime: PodliteRuntime) -> Self {
        Self { runtime }
    }
}

fn ready(condition: &str) -> cri::RuntimeCondition {
    cri::RuntimeCondition {
        r#type: condition.to_string(),
        status: true,
        ..Default::default()
    }
}

#[tonic::async_trait]
impl RuntimeService for CriRuntimeService {
    async fn version(
        &self,
        _request: Request<cri::VersionRequest>,
    ) -> Result<Response<cri::VersionResponse>, Status> {
        Ok(Response::new(cri::VersionResponse {
            version: version::KUBELET_API_VERSION.to_string(),
            runtime_name: version::RUNTIME_NAME.to_string(),
            runtime_version: version::RUNTIME_VERSION.to_string(),
            runtime_api_version: version::RUNTIME_API_VERSION.to_string(),
        }))
    }

    async fn run_pod_sandbox(
        &self,
        request: Request<cri::RunPodSandboxRequest>,
    ) -> Result<Response<cri::RunPodSandboxResponse>, Status> {
        let sandbox = convert::sandbox_request(request.into_inner())?;
        let pod_sandbox_id = self.runtime.run_pod_sandbox(sandbox).await?;
        Ok(Response::new(cri::RunPodSandboxResponse { pod_sandbox_id }))
    }

    async fn pod_sandbox_status(
        &self,
        request: Request<cri::PodSandboxStatusRequest>,
    ) -> Result<Response<cri::PodSandboxStatusResponse>, Status> {
        let record = self
            .runtime
            .pod_sandbox_status(&request.get_ref().pod_sandbox_id)?;
        Ok(Response::new(cri::PodSandboxStatusResponse {
            status: Some(convert::pod_sandbox_status(&record)),
            info: Default::default(),
        }))
    }

    async fn list_pod_sandbox(
        &self,
        request: Request<cri::ListPodSandboxRequest>,
    ) -> Result<Response<cri::ListPodSandboxResponse>, Status> {
        let filter = convert::sandbox_filter(request.into_inner().filter)?;
        let items = self
            .runtime
            .list_pod_sandboxes(&filter)
            .iter()
            .map(convert::pod_sandbox)
            .collect();
        Ok(Response::new(cri::ListPodSandboxResponse { items }))
    }

    async fn create_container(
        &self,
        request: Request<cri::CreateContainerRequest>,
    ) -> Result<Response<cri::CreateContainerResponse>, Status> {
        let container = convert::container_request(request.into_inner())?;
        let container_id = self.runtime.create_container(container).await?;
        Ok(Response::new(cri::CreateContainerResponse { container_id }))
    }

    async fn start_container(
        &self,
        request: Request<cri::StartContainerRequest>,
    ) -> Result<Response<cri::StartContainerResponse>, Status> {
        self.runtime
            .start_container(&request.get_ref().container_id)?;
        Ok(Response::new(cri::StartContainerResponse {}))
    }

    async fn list_containers(
        &self,
        request: Request<cri::ListContainersRequest>,
    ) -> Result<Response<cri::ListContainersResponse>, Status> {
        let filter = convert::container_filter(request.into_inner().filter)?;
        let containers = self
            .runtime
            .list_containers(&filter)
            .iter()
            .map(convert::container)
            .collect();
        Ok(Response::new(cri::ListContainersResponse { containers }))
    }

    async fn container_status(
        &self,
        request: Request<cri::ContainerStatusRequest>,
    ) -> Result<Response<cri::ContainerStatusResponse>, Status> {
        let record = self
            .runtime
            .container_status(&request.get_ref().container_id)?;
        Ok(Response::new(cri::ContainerStatusResponse {
            status: Some(convert::container_status(&record)),
            info: Default::default(),
        }))
    }

    async fn status(
        &self,
        request: Request<cri::StatusRequest>,
    ) -> Result<Response<cri::StatusResponse>, Status> {
        let info = if request.get_ref().verbose {
            self.runtime.metrics().to_info()
        } else {
            Default::default()
        };
        Ok(Response::new(cri::StatusResponse {
            status: Some(cri::RuntimeStatus {
                conditions: vec![
                    ready(conditions::RUNTIME_READY),
                    ready(conditions::NETWORK_READY),
                ],
            }),
            info,
        }))
    }
}
