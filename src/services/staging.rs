//! Transient staging of uploaded bodies on local disk.
//!
//! A staged file exists only between receipt of the upload and the end of the
//! forward attempt. [`StagedFile`] removes it when dropped, so every exit path
//! of the upload (success, store error, early return, panic unwinding) leaves
//! the staging directory clean.

use bytes::Bytes;
use futures::{Stream, StreamExt, pin_mut};
use std::{
    fs as std_fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::{debug, error};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("failed to read upload body: {0}")]
    Body(io::Error),
    #[error("failed to write staged file: {0}")]
    Io(#[from] io::Error),
}

/// Local directory holding uploads until they are forwarded.
#[derive(Clone, Debug)]
pub struct StagingArea {
    dir: PathBuf,
}

/// An uploaded body sitting on local disk. Deleted on drop.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    size_bytes: u64,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the staging directory if it does not exist yet.
    pub async fn ensure_exists(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Write `stream` to a uniquely named file in the staging directory.
    ///
    /// Names are generated, never derived from client input, so concurrent
    /// uploads of the same file name do not collide.
    pub async fn stage<S>(&self, stream: S) -> Result<StagedFile, StagingError>
    where
        S: Stream<Item = io::Result<Bytes>> + Send,
    {
        // Declared before `file`: the handle must close before the guard
        // removes the path.
        let mut staged = StagedFile {
            path: self.dir.join(format!(".upload-{}", Uuid::new_v4())),
            size_bytes: 0,
        };
        let mut file = File::create(&staged.path).await?;

        pin_mut!(stream);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(StagingError::Body)?;
            file.write_all(&chunk).await?;
            staged.size_bytes += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(
            "staged {} bytes at {}",
            staged.size_bytes,
            staged.path.display()
        );
        Ok(staged)
    }
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        match std_fs::remove_file(&self.path) {
            Ok(()) => debug!("removed staged file {}", self.path.display()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => error!(
                "failed to delete staged file {}: {}",
                self.path.display(),
                err
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunks(parts: &[&'static [u8]]) -> impl Stream<Item = io::Result<Bytes>> + Send {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(Bytes::from_static(p)))
                .collect::<Vec<_>>(),
        )
    }

    fn entries(dir: &Path) -> usize {
        std_fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn staged_file_holds_the_body_until_dropped() {
        let tmp = tempfile::tempdir().unwrap();
        let area = StagingArea::new(tmp.path());

        let staged = area.stage(chunks(&[b"a,b,c\n", b"1,2,3\n"])).await.unwrap();
        assert_eq!(staged.size_bytes(), 12);
        assert_eq!(std_fs::read(staged.path()).unwrap(), b"a,b,c\n1,2,3\n");

        let path = staged.path().to_path_buf();
        drop(staged);
        assert!(!path.exists());
        assert_eq!(entries(tmp.path()), 0);
    }

    #[tokio::test]
    async fn broken_body_leaves_nothing_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let area = StagingArea::new(tmp.path());
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "client went away")),
        ]);

        let err = area.stage(body).await.unwrap_err();
        assert!(matches!(err, StagingError::Body(_)));
        assert_eq!(entries(tmp.path()), 0);
    }

    #[tokio::test]
    async fn missing_staging_dir_is_a_write_error() {
        let tmp = tempfile::tempdir().unwrap();
        let area = StagingArea::new(tmp.path().join("absent"));

        let err = area.stage(chunks(&[b"data"])).await.unwrap_err();
        assert!(matches!(err, StagingError::Io(_)));
        assert_eq!(entries(tmp.path()), 0);
    }

    #[tokio::test]
    async fn concurrent_uploads_get_distinct_names() {
        let tmp = tempfile::tempdir().unwrap();
        let area = StagingArea::new(tmp.path());

        let (a, b) = tokio::join!(area.stage(chunks(&[b"one"])), area.stage(chunks(&[b"two"])));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.path(), b.path());
        assert_eq!(entries(tmp.path()), 2);
    }

    #[tokio::test]
    async fn ensure_exists_creates_nested_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let area = StagingArea::new(tmp.path().join("nested/uploads"));
        area.ensure_exists().await.unwrap();
        assert!(area.dir().is_dir());
    }
}
