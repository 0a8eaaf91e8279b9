use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use podlite_shared::PodliteResult;

use super::ImageUnpacker;
use crate::util::ToolCommand;

/// `umoci unpack --image {image} {dest}`
#[derive(Debug, Clone)]
pub struct UmociUnpacker {
    binary: String,
    timeout: Option<Duration>,
}

impl UmociUnpacker {
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

    pub fn unpack_command(&self, image_path: &Path, dest_path: &Path) -> ToolCommand {
        ToolCommand::new(&self.binary)
            .timeout(self.timeout)
            .args(["unpack", "--image"])
            .arg(image_path.display().to_string())
            .arg(dest_path.display().to_string())
    }
}

#[async_trait]
impl ImageUnpacker for UmociUnpacker {
    async fn unpack(&self, image_path: &Path, dest_path: &Path) -> PodliteResult<()> {
        self.unpack_command(image_path, dest_path).run().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_command() {
        let cmd = UmociUnpacker::new("umoci").unpack_command(
            Path::new("/var/lib/podlite/images/app:1"),
            Path::new("/var/lib/podlite/default-web-sandbox-app"),
        );
        assert_eq!(
            cmd.arguments(),
            &[
                "unpack",
                "--image",
                "/var/lib/podlite/images/app:1",
                "/var/lib/podlite/default-web-sandbox-app"
            ]
        );
    }
}
