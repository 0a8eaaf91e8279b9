//! gRPC front end: the CRI runtime and image services on a Unix socket.

mod convert;
mod image_service;
mod runtime_service;

pub use image_service::CriImageService;
pub use runtime_service::CriRuntimeService;

use std::future::Future;
use std::path::Path;

use podlite_shared::cri::image_service_server::ImageServiceServer;
use podlite_shared::cri::runtime_service_server::RuntimeServiceServer;
use podlite_shared::{PodliteError, PodliteResult};
use tokio::net::UnixListener;
use tokio_stream::wrappers::UnixListenerStream;
use tonic::transport::Server;

use crate::runtime::PodliteRuntime;

/// Serve both CRI services on `socket_path` until `shutdown` resolves.
///
/// The socket file must not exist yet.
pub async fn serve<F>(runtime: PodliteRuntime, socket_path: &Path, shutdown: F) -> PodliteResult<()>
where
    F: Future<Output = ()>,
{
    let listener = UnixListener::bind(socket_path).map_err(|e| {
        PodliteError::Storage(format!(
            "Failed to bind socket {}: {}",
            socket_path.display(),
            e
        ))
    })?;
    tracing::info!(socket = %socket_path.display(), "CRI server listening");

    Server::builder()
        .add_service(RuntimeServiceServer::new(CriRuntimeService::new(
            runtime.clone(),
        )))
        .add_service(ImageServiceServer::new(CriImageService::new(runtime)))
        .serve_with_incoming_shutdown(UnixListenerStream::new(listener), shutdown)
        .await
        .map_err(|e| PodliteError::Internal(format!("gRPC server failed: {}", e)))?;

    tracing::info!("CRI server stopped");
    Ok(())
}
