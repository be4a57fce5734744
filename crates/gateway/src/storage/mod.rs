//! # Blob Store
//!
//! ストレージキーでアドレスされるバイト列ストアの抽象インターフェース。
//! ローカルディスク実装は `disk` サブモジュールを参照。

pub mod disk;

pub use disk::DiskStore;

use bytes::Bytes;

/// Blob Storeのエラー型。
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 指定キーのBlobが存在しない
    #[error("Blobが存在しません: {0}")]
    NotFound(String),
    /// ストレージキーとして使用できない文字列
    #[error("不正なストレージキー: {0:?}")]
    InvalidKey(String),
    /// ディスクI/Oエラー
    #[error("ディスクI/Oに失敗: {0}")]
    Io(#[from] std::io::Error),
}

/// 書き込み途中のBlob。
///
/// [`StagedBlob::commit`] されるまで、書き込んだバイト列は読み出せない。
/// commitせずに破棄した場合、途中のデータは残らない。
#[async_trait::async_trait]
pub trait StagedBlob: Send {
    /// 末尾にバイト列を追記する。
    async fn append(&mut self, chunk: &[u8]) -> Result<(), StorageError>;

    /// 書き込んだ内容をキーのBlobとして確定する。既存のBlobは置き換えられる。
    async fn commit(self: Box<Self>) -> Result<(), StorageError>;

    /// 書き込んだ内容を破棄する。既存のBlobには触れない。
    async fn abort(self: Box<Self>);
}

/// Blob Storeの抽象インターフェース。
///
/// `read` と `write` はキー単位でアトミックであること。
/// 書き込み途中のバイト列が読み出されてはならない。
/// 同一キーへの並行書き込みの順序付けは実装に委ねる。
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// キーに対応するバイト列を読み出す。存在しなければ `StorageError::NotFound`。
    async fn read(&self, key: &str) -> Result<Bytes, StorageError>;

    /// キーへの書き込みを開始する。
    async fn stage(&self, key: &str) -> Result<Box<dyn StagedBlob>, StorageError>;

    /// キーにバイト列を一括で書き込む。既存のBlobは置き換えられる。
    async fn write(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
        let mut staged = self.stage(key).await?;
        if let Err(e) = staged.append(&data).await {
            staged.abort().await;
            return Err(e);
        }
        staged.commit().await
    }

    /// キーに対応するBlobが存在するか。
    ///
    /// リクエスト処理では使わない。テストや運用時の確認用。
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}
