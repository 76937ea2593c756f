//! AWS configuration and credential bootstrap.

use aws_config::BehaviorVersion;

use crate::prelude::*;

/// Load the user's AWS configuration using standard conventions.
pub async fn load_aws_config() -> Result<aws_config::SdkConfig> {
    Ok(aws_config::load_defaults(BehaviorVersion::v2025_01_17()).await)
}

/// Write AWS credentials passed through the `TOKEN` environment variable to
/// the shared credentials file, overwriting any existing file.
///
/// Hosted runners hand us a complete credentials file as an environment
/// variable. Writing it out once, before any AWS client is built, lets the
/// SDK's default provider chain pick it up. Does nothing when `TOKEN` is
/// unset.
pub async fn bootstrap_credentials_file() -> Result<Option<PathBuf>> {
    let Ok(credentials) = std::env::var("TOKEN") else {
        return Ok(None);
    };
    let path = credentials_file_path()?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    tokio::fs::write(&path, credentials)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    debug!("wrote AWS credentials to {}", path.display());
    Ok(Some(path))
}

/// Where the shared AWS credentials file lives, honoring the SDK's
/// `AWS_SHARED_CREDENTIALS_FILE` override.
fn credentials_file_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("AWS_SHARED_CREDENTIALS_FILE") {
        return Ok(PathBuf::from(path));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(Path::new(&home).join(".aws").join("credentials"))
}
