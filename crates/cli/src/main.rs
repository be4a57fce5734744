//! # Disklink CLI
//!
//! ディスクGateway向けの署名付きURLを発行する運用ツール。
//! Gatewayと同じ `DISKLINK_SECRET_KEY` を使う。
//!
//! ## サブコマンド
//! - `download-url` — ダウンロード用URLを発行
//! - `upload-url` — 直接アップロード用URLを発行（ローカルファイルからチェックサムを計算）
//! - `checksum` — ファイルのチェックサム（MD5, Base64）を表示

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use disklink_crypto::{compute_checksum, MessageVerifier};
use disklink_gateway::urls::{generate_key, SignedUrlIssuer};
use disklink_types::Disposition;

#[derive(Parser)]
#[command(name = "disklink-cli", version, about = "Disklink 署名付きURL発行ツール")]
struct Cli {
    /// トークン署名用秘密鍵（16進数）
    #[arg(long, env = "DISKLINK_SECRET_KEY", hide_env_values = true, global = true)]
    secret_key: Option<String>,

    /// Gatewayの公開URL
    #[arg(
        long,
        env = "DISKLINK_PUBLIC_URL",
        default_value = "http://localhost:3000",
        global = true
    )]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// ダウンロード用URLを発行する
    DownloadUrl {
        /// ストレージキー
        #[arg(long)]
        key: String,
        /// Content-Dispositionに載せるファイル名
        #[arg(long)]
        filename: Option<String>,
        /// レスポンスのContent-Type
        #[arg(long)]
        content_type: Option<String>,
        /// inline または attachment
        #[arg(long, default_value = "inline")]
        disposition: String,
        /// 有効期限（秒）
        #[arg(long, default_value_t = 300)]
        expires_in: u64,
    },
    /// 直接アップロード用URLを発行する
    UploadUrl {
        /// ストレージキー（省略時はランダム生成）
        #[arg(long)]
        key: Option<String>,
        /// アップロード予定のファイル（チェックサム計算用）
        #[arg(long, required_unless_present = "checksum", conflicts_with = "checksum")]
        file: Option<PathBuf>,
        /// 計算済みのチェックサム（MD5, Base64）
        #[arg(long)]
        checksum: Option<String>,
        /// 有効期限（秒）
        #[arg(long, default_value_t = 300)]
        expires_in: u64,
    },
    /// ファイルのチェックサムを表示する
    Checksum {
        /// 対象ファイル
        file: PathBuf,
    },
}

/// 秘密鍵とベースURLからURL発行者を構築する。
fn build_issuer(secret_key: Option<&str>, base_url: &str) -> anyhow::Result<SignedUrlIssuer> {
    let Some(key_hex) = secret_key else {
        bail!("DISKLINK_SECRET_KEY（または --secret-key）が必要です");
    };
    let secret =
        hex::decode(key_hex.trim()).context("DISKLINK_SECRET_KEYは16進数である必要があります")?;
    let verifier = MessageVerifier::new(secret)?;
    Ok(SignedUrlIssuer::new(verifier, base_url)?)
}

fn file_checksum(path: &Path) -> anyhow::Result<String> {
    let data = std::fs::read(path)
        .with_context(|| format!("ファイルの読み込みに失敗: {}", path.display()))?;
    Ok(compute_checksum(&data))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::DownloadUrl {
            key,
            filename,
            content_type,
            disposition,
            expires_in,
        } => {
            let issuer = build_issuer(cli.secret_key.as_deref(), &cli.base_url)?;
            let url = issuer.download_url(
                &key,
                Duration::from_secs(expires_in),
                filename.as_deref(),
                content_type.as_deref(),
                Disposition::from_param(Some(&disposition)),
            )?;
            println!("{url}");
        }
        Command::UploadUrl {
            key,
            file,
            checksum,
            expires_in,
        } => {
            let issuer = build_issuer(cli.secret_key.as_deref(), &cli.base_url)?;
            let checksum = match (checksum, file) {
                (Some(checksum), _) => checksum,
                (None, Some(path)) => file_checksum(&path)?,
                (None, None) => bail!("--file または --checksum が必要です"),
            };
            let key = key.unwrap_or_else(generate_key);
            let url = issuer.upload_url(&key, &checksum, Duration::from_secs(expires_in))?;
            println!("key: {key}");
            println!("checksum: {checksum}");
            println!("url: {url}");
        }
        Command::Checksum { file } => {
            println!("{}", file_checksum(&file)?);
        }
    }

    Ok(())
}
