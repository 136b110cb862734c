//! CLI entry point for postgrab.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use postgrab_core::{
    DownloadSummary, DownloadedMedia, ExtractorConfig, MediaDownloader, PostExtractor,
};
use tracing::{debug, error, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.default_log_level()));

    // stdout carries only the JSON result
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let config = args.apply(ExtractorConfig::default());
    config.validate().context("invalid configuration")?;
    let extractor = PostExtractor::new(config).context("failed to build HTTP client")?;

    let result = match extractor.extract_with_retry(&args.post_url).await {
        Ok(result) => result,
        Err(e) => {
            error!(url = %args.post_url, error = %e, "extraction failed");
            eprintln!("{}", e.user_message());
            return Ok(ExitCode::from(e.exit_code()));
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);

    if args.download {
        let downloader = MediaDownloader::from_extractor(&extractor);
        let media = downloader
            .download(&result.media_candidates(), Some(result.preferred_referer.as_str()))
            .await;
        write_media(&args.output_dir, &media).await?;

        let summary = DownloadSummary::from_media(&media);
        info!(
            images = summary.images,
            videos = summary.videos,
            documents = summary.documents,
            bytes = summary.total_bytes,
            output_dir = %args.output_dir.display(),
            "Download complete"
        );
    }

    Ok(ExitCode::SUCCESS)
}

async fn write_media(output_dir: &Path, media: &[DownloadedMedia]) -> Result<()> {
    if media.is_empty() {
        return Ok(());
    }
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("cannot create {}", output_dir.display()))?;
    for item in media {
        let path = output_dir.join(&item.filename);
        tokio::fs::write(&path, &item.buffer)
            .await
            .with_context(|| format!("cannot write {}", path.display()))?;
        debug!(path = %path.display(), bytes = item.buffer.len(), "media written");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use postgrab_core::MediaType;

    use super::*;

    fn media(filename: &str, bytes: &[u8]) -> DownloadedMedia {
        DownloadedMedia {
            url: format!("https://media.licdn.com/dms/image/{filename}"),
            buffer: bytes.to_vec(),
            media_type: MediaType::Image,
            mime_type: "image/jpeg".to_string(),
            filename: filename.to_string(),
        }
    }

    #[tokio::test]
    async fn test_write_media_creates_dir_and_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let out = tmp.path().join("nested").join("out");

        write_media(&out, &[media("image-01.jpg", b"one"), media("image-02.jpg", b"two")])
            .await
            .unwrap();

        assert_eq!(std::fs::read(out.join("image-01.jpg")).unwrap(), b"one");
        assert_eq!(std::fs::read(out.join("image-02.jpg")).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_write_media_empty_batch_creates_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let out = tmp.path().join("never");

        write_media(&out, &[]).await.unwrap();

        assert!(!out.exists());
    }
}
