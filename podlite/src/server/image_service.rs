//! CRI `ImageService`.

use podlite_shared::cri;
use podlite_shared::cri::image_service_server::ImageService;
use tonic::{Request, Response, Status};

use super::convert;
use crate::runtime::PodliteRuntime;

#[derive(Debug, Clone)]
pub struct CriImageService {
    runtime: PodliteRuntime,
}

impl CriImageService {
    pub fn new(runtime: PodliteRuntime) -> Self {
        Self { runtime }
    }
}

#[tonic::async_trait]
impl ImageService for CriImageService {
    async fn list_images(
        &self,
        request: Request<cri::ListImagesRequest>,
    ) -> Result<Response<cri::ListImagesResponse>, Status> {
        let reference = convert::image_filter(request.into_inner().filter);
        let images = self
            .runtime
            .list_images(reference.as_deref())
            .iter()
            .map(convert::image)
            .collect();
        Ok(Response::new(cri::ListImagesResponse { images }))
    }

    /// An unknown image is a successful response without an image.
    async fn image_status(
        &self,
        request: Request<cri::ImageStatusRequest>,
    ) -> Result<Response<cri::ImageStatusResponse>, Status> {
        let reference = convert::image_reference(request.into_inner().image)?;
        let image = self.runtime.image_status(&reference);
        if image.is_none() {
            tracing::debug!(image = %reference, "Image not present");
        }
        Ok(Response::new(cri::ImageStatusResponse {
            image: image.as_ref().map(convert::image),
            info: Default::default(),
        }))
    }

    async fn pull_image(
        &self,
        request: Request<cri::PullImageRequest>,
    ) -> Result<Response<cri::PullImageResponse>, Status> {
        let reference = convert::image_reference(request.into_inner().image)?;
        let image_ref = self.runtime.pull_image(&reference).await?;
        Ok(Response::new(cri::PullImageResponse { image_ref }))
    }

    async fn image_fs_info(
        &self,
        _request: Request<cri::ImageFsInfoRequest>,
    ) -> Result<Response<cri::ImageFsInfoResponse>, Status> {
        let usage = self.runtime.image_fs_usage().await;
        let filesystem = cri::FilesystemUsage {
            timestamp: usage.timestamp,
            fs_id: Some(cri::FilesystemIdentifier {
                mountpoint: usage.mountpoint.display().to_string(),
            }),
            used_bytes: Some(cri::UInt64Value {
                value: usage.used_bytes,
            }),
            inodes_used: None,
        };
        Ok(Response::new(cri::ImageFsInfoResponse {
            image_filesystems: vec![filesystem],
            container_filesystems: Vec::new(),
        }))
    }
}
