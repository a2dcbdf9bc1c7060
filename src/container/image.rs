use futures::StreamExt;

use crate::engine::Engine;
use crate::error::LauncherError;

/// Split `repo[:tag]` into repository and tag, defaulting the tag to
/// `latest`. A colon that belongs to a registry port is not a tag separator.
pub fn split_image_ref(reference: &str) -> (&str, &str) {
    if reference.contains('@') {
        // digest references are pulled as-is
        return (reference, "");
    }
    match reference.rsplit_once(':') {
        Some((repo, tag)) if !tag.contains('/') => (repo, tag),
        _ => (reference, "latest"),
    }
}

/// Make sure `image` exists locally, pulling it when the engine doesn't have
/// it. Pull progress is logged and drained before returning.
pub async fn ensure_image(engine: &dyn Engine, image: &str) -> Result<(), LauncherError> {
    match engine.inspect_image(image).await {
        Ok(()) => {
            tracing::debug!("Image {} already available", image);
            return Ok(());
        }
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e.into()),
    }

    tracing::info!("Pulling image: {}", image);
    let mut progress = engine.pull_image(image);

    while let Some(result) = progress.next().await {
        match result {
            Ok(info) => {
                if let Some(status) = info.status {
                    tracing::info!("Image pull: {}", status);
                }
                if let Some(detail) = info.progress {
                    tracing::debug!("{}", detail);
                }
            }
            Err(e) => {
                tracing::error!("Image pull failed for {}: {}", image, e);
                return Err(LauncherError::PullFailed {
                    image: image.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    tracing::info!("Image {} pulled successfully", image);
    Ok(())
}
