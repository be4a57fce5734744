//! # 署名付きURL発行
//!
//! ディスクGatewayの `/disk/{token}` を指す、有効期限付きURLを組み立てる。
//! URLの発行はGateway外（アプリケーションやCLI）で行う。Gateway自体は検証のみを担う。

use std::time::Duration;

use disklink_crypto::{MessageVerifier, TokenError};
use disklink_types::{BlobMetadata, Disposition, Purpose};
use rand::Rng;
use reqwest::Url;

/// 生成するストレージキーの長さ
const GENERATED_KEY_LEN: usize = 28;

/// ストレージキーに使う文字（base36）
const KEY_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// URL発行のエラー型。
#[derive(Debug, thiserror::Error)]
pub enum UrlError {
    /// ベースURLが不正
    #[error("ベースURLが不正です: {0}")]
    InvalidBaseUrl(String),
    /// トークン生成に失敗
    #[error("トークン生成に失敗: {0}")]
    Token(#[from] TokenError),
}

/// 新しいBlob用のランダムなストレージキーを生成する。
pub fn generate_key() -> String {
    let mut rng = rand::rngs::OsRng;
    (0..GENERATED_KEY_LEN)
        .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
        .collect()
}

/// 署名付きURLの発行者。
///
/// Gatewayと同じ秘密鍵の [`MessageVerifier`] を持つ。
pub struct SignedUrlIssuer {
    verifier: MessageVerifier,
    base_url: Url,
}

impl SignedUrlIssuer {
    /// # 引数
    /// - `verifier`: Gatewayと同じ秘密鍵で構築した検証器
    /// - `base_url`: Gatewayの公開URL（例: `https://files.example.com`）
    pub fn new(verifier: MessageVerifier, base_url: &str) -> Result<Self, UrlError> {
        let base_url =
            Url::parse(base_url).map_err(|e| UrlError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(UrlError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self { verifier, base_url })
    }

    /// `{base}/disk/{token}` を組み立てる。
    fn disk_url(&self, token: &str) -> Result<Url, UrlError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UrlError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("disk")
            .push(token);
        Ok(url)
    }

    /// ダウンロード用URLを発行する。
    ///
    /// `filename` と `content_type` はクエリに載り、Gatewayはそれをそのままヘッダに返す。
    pub fn download_url(
        &self,
        key: &str,
        expires_in: Duration,
        filename: Option<&str>,
        content_type: Option<&str>,
        disposition: Disposition,
    ) -> Result<String, UrlError> {
        let token = self
            .verifier
            .generate(&key, Purpose::BlobKey, Some(expires_in))?;
        let mut url = self.disk_url(&token)?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(filename) = filename {
                query.append_pair("filename", filename);
            }
            if let Some(content_type) = content_type {
                query.append_pair("content_type", content_type);
            }
            query.append_pair("disposition", disposition.as_str());
        }
        Ok(url.into())
    }

    /// 直接アップロード用URLを発行する。
    ///
    /// `checksum` はアップロードされるバイト列のMD5（Base64）。
    pub fn upload_url(
        &self,
        key: &str,
        checksum: &str,
        expires_in: Duration,
    ) -> Result<String, UrlError> {
        let metadata = BlobMetadata {
            key: key.to_string(),
            checksum: checksum.to_string(),
        };
        let token = self
            .verifier
            .generate(&metadata, Purpose::BlobMetadata, Some(expires_in))?;
        Ok(self.disk_url(&token)?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE_MINUTES: Duration = Duration::from_secs(300);

    fn test_issuer(base_url: &str) -> SignedUrlIssuer {
        SignedUrlIssuer::new(
            MessageVerifier::new(b"test-secret-key".to_vec()).unwrap(),
            base_url,
        )
        .unwrap()
    }

    /// URLのパスからトークンを取り出す
    fn token_of(url: &str) -> String {
        let url = Url::parse(url).unwrap();
        url.path_segments().unwrap().last().unwrap().to_string()
    }

    #[test]
    fn test_download_url() {
        let issuer = test_issuer("https://files.example.com");
        let url = issuer
            .download_url(
                "abc123",
                FIVE_MINUTES,
                Some("my report.pdf"),
                Some("application/pdf"),
                Disposition::Attachment,
            )
            .unwrap();

        let parsed = Url::parse(&url).unwrap();
        assert!(parsed.path().starts_with("/disk/"));
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("filename".to_string(), "my report.pdf".to_string()),
                ("content_type".to_string(), "application/pdf".to_string()),
                ("disposition".to_string(), "attachment".to_string()),
            ]
        );

        let verifier = MessageVerifier::new(b"test-secret-key".to_vec()).unwrap();
        let key: String = verifier.verify(&token_of(&url), Purpose::BlobKey).unwrap();
        assert_eq!(key, "abc123");
    }

    #[test]
    fn test_upload_url() {
        let issuer = test_issuer("https://files.example.com/prefix/");
        let url = issuer
            .upload_url("abc123", "XUFAKrxLKna5cZ2REBfFkg==", FIVE_MINUTES)
            .unwrap();

        let parsed = Url::parse(&url).unwrap();
        assert!(parsed.path().starts_with("/prefix/disk/"));
        assert_eq!(parsed.query(), None);

        let verifier = MessageVerifier::new(b"test-secret-key".to_vec()).unwrap();
        let metadata: BlobMetadata = verifier
            .verify(&token_of(&url), Purpose::BlobMetadata)
            .unwrap();
        assert_eq!(metadata.key, "abc123");
        assert_eq!(metadata.checksum, "XUFAKrxLKna5cZ2REBfFkg==");
    }

    #[test]
    fn test_invalid_base_url() {
        let verifier = MessageVerifier::new(b"test-secret-key".to_vec()).unwrap();
        assert!(SignedUrlIssuer::new(verifier.clone(), "not a url").is_err());
        assert!(SignedUrlIssuer::new(verifier, "mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_generate_key() {
        let key = generate_key();
        assert_eq!(key.len(), GENERATED_KEY_LEN);
        assert!(key.bytes().all(|b| KEY_ALPHABET.contains(&b)));
        assert_ne!(key, generate_key());
    }
}
