use crate::error::ProfileError;
use axum::body::Bytes;
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

/// A file that has been fully written and synced to disk.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub name: String,
    pub path: PathBuf,
    pub url: String,
    pub bytes: u64,
}

/// Fixed directory receiving profile images. Stored names are generated
/// server-side; the client's filename never reaches the filesystem.
#[derive(Debug, Clone)]
pub struct UploadDir {
    dir: PathBuf,
    url_prefix: String,
}

impl UploadDir {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_exists(&self) -> Result<(), ProfileError> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    pub fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.url_prefix.trim_end_matches('/'), name)
    }

    /// Stream `body` into `<uuid>.<ext>`. Bytes land in a `.part` file that is
    /// synced and renamed into place; on failure the partial file is removed.
    pub async fn store<S, E>(&self, extension: &str, body: S) -> Result<StoredFile, ProfileError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        ProfileError: From<E>,
    {
        let name = format!("{}.{}", Uuid::new_v4(), extension);
        let path = self.dir.join(&name);
        let part = self.dir.join(format!(".{name}.part"));

        let written = match write_synced(&part, body).await {
            Ok(n) => n,
            Err(e) => {
                discard(&part).await;
                return Err(e);
            }
        };
        if let Err(e) = fs::rename(&part, &path).await {
            discard(&part).await;
            return Err(e.into());
        }

        debug!(path = %path.display(), bytes = written, "upload persisted");
        Ok(StoredFile {
            url: self.url_for(&name),
            name,
            path,
            bytes: written,
        })
    }

    /// Remove the file behind a URL previously produced by [`Self::url_for`].
    /// URLs outside this directory are left alone. Failures are logged only.
    pub async fn remove_url(&self, url: &str) {
        let prefix = format!("{}/", self.url_prefix.trim_end_matches('/'));
        let Some(name) = url.strip_prefix(&prefix) else {
            warn!(url, "not removing file outside the upload directory");
            return;
        };
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            warn!(url, "not removing file with unexpected name");
            return;
        }

        let path = self.dir.join(name);
        match fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "replaced upload removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove replaced upload")
            }
        }
    }
}

async fn write_synced<S, E>(path: &Path, body: S) -> Result<u64, ProfileError>
where
    S: Stream<Item = Result<Bytes, E>>,
    ProfileError: From<E>,
{
    let mut file = fs::File::create(path).await?;
    let mut body = std::pin::pin!(body);
    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %e, "failed to remove partial upload");
    }
}
