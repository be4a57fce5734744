//! # ローカルディスク Blob Store
//!
//! ルートディレクトリ配下にBlobを保存する実装。
//!
//! ディレクトリ構成: `{root}/{key[0..2]}/{key[2..4]}/{key}`
//! 4文字未満のキーは `_` で埋めて同じ深さに置く（`ab` → `{root}/ab/__/ab`）。
//! Blobは常に3階層目のファイルで、ディレクトリと名前が衝突することはない。

use std::path::PathBuf;

use bytes::Bytes;
use tokio::io::AsyncWriteExt;

use super::{BlobStore, StagedBlob, StorageError};

/// ストレージキーに使用できる文字か。
/// `/` や `.` を含まないため、キーがルート外のパスを指すことはない。
fn is_key_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// ローカルディスク上のBlob Store。
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// 新しいDiskStoreを作成する。
    ///
    /// # 引数
    /// - `root`: Blobを格納するディレクトリ（存在しなければ書き込み時に作成）
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// キーに対応するファイルパスを返す。
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() || !key.bytes().all(is_key_char) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        // キーはASCIIのみなのでバイト位置で切り出せる
        let padded = format!("{key:_<4}");
        Ok(self
            .root
            .join(&padded[0..2])
            .join(&padded[2..4])
            .join(key))
    }
}

/// 同一ディレクトリの一時ファイルへの書き込み。
///
/// commit時にrenameでBlobを置き換える。commitされずにdropされた場合は一時ファイルを削除する。
struct StagedFile {
    file: Option<tokio::fs::File>,
    tmp_path: PathBuf,
    path: PathBuf,
    written: u64,
}

impl StagedFile {
    async fn discard(&mut self) {
        self.file = None;
        let _ = tokio::fs::remove_file(&self.tmp_path).await;
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.file.take().is_some() {
            let _ = std::fs::remove_file(&self.tmp_path);
        }
    }
}

#[async_trait::async_trait]
impl StagedBlob for StagedFile {
    async fn append(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        let file = self.file.as_mut().ok_or_else(|| {
            StorageError::Io(std::io::Error::other("書き込みは既に終了しています"))
        })?;
        file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// 並行書き込みは最後にrenameしたものが残る。
    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let mut this = self;
        let Some(mut file) = this.file.take() else {
            return Err(StorageError::Io(std::io::Error::other(
                "書き込みは既に終了しています",
            )));
        };

        let result = async {
            file.flush().await?;
            drop(file);
            tokio::fs::rename(&this.tmp_path, &this.path).await
        }
        .await;
        if let Err(e) = result {
            this.discard().await;
            return Err(e.into());
        }

        tracing::debug!(
            path = %this.path.display(),
            bytes = this.written,
            "Blobを書き込みました"
        );
        Ok(())
    }

    async fn abort(self: Box<Self>) {
        let mut this = self;
        this.discard().await;
    }
}

#[async_trait::async_trait]
impl BlobStore for DiskStore {
    async fn read(&self, key: &str) -> Result<Bytes, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn stage(&self, key: &str) -> Result<Box<dyn StagedBlob>, StorageError> {
        let path = self.path_for(key)?;
        let dir = path.parent().unwrap_or(&self.root).to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;

        // 先頭の "." はキーに使えない文字なので、Blobと名前が衝突しない
        let tmp_path = dir.join(format!(".{key}.{}.tmp", uuid::Uuid::new_v4()));
        let file = tokio::fs::File::create(&tmp_path).await?;

        Ok(Box::new(StagedFile {
            file: Some(file),
            tmp_path,
            path,
            written: 0,
        }))
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}
