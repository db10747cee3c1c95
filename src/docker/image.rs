use bollard::query_parameters::RemoveImageOptions;
use bollard::Docker;

use crate::error::{Error, Result};
use crate::outcome::Outcome;

/// Force-remove an image by tag.
pub async fn remove_image(docker: &Docker, image: &str) -> Result<Outcome> {
    let options = RemoveImageOptions {
        force: true,
        ..Default::default()
    };
    match docker.remove_image(image, Some(options), None).await {
        Ok(_) => {
            tracing::debug!(image = %image, "image removed");
            Ok(Outcome::Applied)
        }
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        }) => Ok(Outcome::Unchanged),
        Err(e) => Err(Error::docker(format!("removing image {}", image), e)),
    }
}
