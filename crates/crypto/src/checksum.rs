//! # チェックサム
//!
//! アップロードされたバイト列の完全性検証に使うダイジェスト。
//! オブジェクトストレージの `Content-MD5` と同じ形式（MD5 → Base64 Standard）。

use base64::Engine;
use md5::{Digest, Md5};

/// Base64エンジン（Standard）
fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}

/// バイト列のチェックサムを計算する。
pub fn compute_checksum(data: &[u8]) -> String {
    b64().encode(Md5::digest(data))
}

/// 分割して届くバイト列のチェックサムを逐次計算する。
///
/// 全体を一度に [`compute_checksum`] に渡した場合と同じ値になる。
#[derive(Clone, Default)]
pub struct ChecksumHasher {
    digest: Md5,
    len: u64,
}

impl ChecksumHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.digest.update(chunk);
        self.len += chunk.len() as u64;
    }

    /// これまでに受け取ったバイト数
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn finalize(self) -> String {
        b64().encode(self.digest.finalize())
    }
}

/// バイト列が期待するチェックサムと一致するかを判定する。
pub fn verify_checksum(data: &[u8], expected: &str) -> bool {
    compute_checksum(data) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 既知のMD5ダイジェストと一致することを確認
    #[test]
    fn test_known_digest() {
        // MD5("hello") = 5d41402abc4b2a76b9719d911017c592
        assert_eq!(compute_checksum(b"hello"), "XUFAKrxLKna5cZ2REBfFkg==");
        // MD5("") = d41d8cd98f00b204e9800998ecf8427e
        assert_eq!(compute_checksum(b""), "1B2M2Y8AsgTpgAmY7PhCfg==");
    }

    #[test]
    fn test_verify_checksum() {
        let expected = compute_checksum(b"hello");
        assert!(verify_checksum(b"hello", &expected));
        assert!(!verify_checksum(b"HELLO", &expected));
        assert!(!verify_checksum(b"hello", "not-a-checksum"));
    }

    /// 分割して与えても一括計算と同じ値になる
    #[test]
    fn test_hasher_matches_one_shot() {
        let mut hasher = ChecksumHasher::new();
        assert!(hasher.is_empty());
        for chunk in [&b"he"[..], b"", b"llo"] {
            hasher.update(chunk);
        }
        assert_eq!(hasher.len(), 5);
        assert_eq!(hasher.finalize(), compute_checksum(b"hello"));

        assert_eq!(ChecksumHasher::new().finalize(), compute_checksum(b""));
    }
}
