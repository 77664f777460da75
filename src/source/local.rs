//! Reader using the invoking user's own permissions.

use super::{ReadPrivilege, SecretBytes, SourceError, SourceReader};
use async_trait::async_trait;
use std::path::Path;
use zeroize::Zeroizing;

/// Reads files directly with `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalReader;

#[async_trait]
impl SourceReader for LocalReader {
    fn privilege(&self) -> ReadPrivilege {
        ReadPrivilege::Invoker
    }

    async fn exists(&self, path: &Path) -> Result<bool, SourceError> {
        tokio::fs::try_exists(path)
            .await
            .map_err(|source| SourceError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    async fn read(&self, path: &Path) -> Result<SecretBytes, SourceError> {
        tokio::fs::read(path)
            .await
            .map(Zeroizing::new)
            .map_err(|source| SourceError::Io {
                path: path.to_path_buf(),
                source,
            })
    }
}
