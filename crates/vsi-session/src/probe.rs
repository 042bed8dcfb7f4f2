use std::io;

use async_trait::async_trait;
use vsi_core::ProjectorRef;

/// Best-effort existence check for a projector resource.
///
/// An `Err` means "could not tell" and is treated exactly like `Ok(false)`.
#[async_trait]
pub trait ResourceProbe: Send + Sync {
    async fn exists(&self, projector: &ProjectorRef) -> io::Result<bool>;
}

/// Probes the local filesystem. Locators without a local path (non-file
/// URIs) cannot be checked and report an `Unsupported` error.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

#[async_trait]
impl ResourceProbe for FsProbe {
    async fn exists(&self, projector: &ProjectorRef) -> io::Result<bool> {
        match projector.local_path() {
            Some(path) => tokio::fs::try_exists(&path).await,
            None => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!(
                    "no local path for scheme '{}'",
                    projector.scheme().unwrap_or_default()
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("llava.mmproj");
        std::fs::write(&path, b"GGUF").unwrap();
        let found = FsProbe.exists(&ProjectorRef::from(path.as_path())).await.unwrap();
        assert!(found);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.mmproj");
        let found = FsProbe.exists(&ProjectorRef::from(path.as_path())).await.unwrap();
        assert!(!found);
    }

    #[tokio::test]
    async fn test_file_uri() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("p.mmproj");
        std::fs::write(&path, b"GGUF").unwrap();
        let uri = ProjectorRef::new(format!("file://{}", path.display()));
        assert!(FsProbe.exists(&uri).await.unwrap());
    }

    #[tokio::test]
    async fn test_foreign_scheme_is_unsupported() {
        let err = FsProbe
            .exists(&ProjectorRef::new("content://media/p.mmproj"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }
}
