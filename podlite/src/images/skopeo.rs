use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use podlite_shared::PodliteResult;

use super::ImagePuller;
use crate::util::ToolCommand;

/// `skopeo copy docker://{ref} oci:{dest}`
#[derive(Debug, Clone)]
pub struct SkopeoPuller {
    binary: String,
    timeout: Option<Duration>,
}

impl SkopeoPuller {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn copy_command(&self, source_ref: &str, dest_path: &Path) -> ToolCommand {
        ToolCommand::new(&self.binary)
            .timeout(self.timeout)
            .arg("copy")
            .arg(format!("docker://{}", source_ref))
            .arg(format!("oci:{}", dest_path.display()))
    }
}

#[async_trait]
impl ImagePuller for SkopeoPuller {
    async fn copy(&self, source_ref: &str, dest_path: &Path) -> PodliteResult<()> {
        self.copy_command(source_ref, dest_path).run().await?;
        Ok(())
    }
}
