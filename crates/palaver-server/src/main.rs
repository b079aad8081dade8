use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use palaver_cdn::FileStorageBackend;
use palaver_core::attachment::UploadFile;
use palaver_server::ServerConfig;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "palaver-server")]
struct Cli {
    #[command(flatten)]
    config: ServerConfig,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file to the storage service
    Upload {
        /// Logical path on the storage service, e.g. /avatars/<user id>
        #[arg(long)]
        path: String,
        /// Local file to send
        file: PathBuf,
        /// MIME type; sniffed from the file when omitted
        #[arg(long)]
        mime: Option<String>,
    },
    /// Delete a file from the storage service
    Delete {
        #[arg(long)]
        path: String,
    },
    /// Store an inline data URL under the public root
    Inline {
        /// Path relative to the public root, without extension
        #[arg(long)]
        save_path: String,
        /// File holding a `data:image/<type>;base64,...` URL
        data_url: PathBuf,
    },
    /// Write a built-in default avatar to disk
    Avatar {
        /// Avatar id, 0 to 5
        id: String,
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cdn = cli.config.cdn();

    match cli.command {
        Some(Commands::Upload { path, file, mime }) => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let mime = mime.unwrap_or_else(|| palaver_cdn::sniff_content_type(&bytes).to_string());
            let upload = UploadFile::new(mime, filename, bytes);

            let attachment = palaver_cdn::create_backend(&cdn)
                .upload(&path, &upload)
                .await?;
            println!("{}", serde_json::to_string_pretty(&attachment)?);
        }
        Some(Commands::Delete { path }) => {
            let reply = palaver_cdn::create_backend(&cdn).delete(&path).await?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Some(Commands::Inline { save_path, data_url }) => {
            let body = tokio::fs::read_to_string(&data_url)
                .await
                .with_context(|| format!("reading {}", data_url.display()))?;
            let store = palaver_cdn::create_inline_store(&cdn);
            match store.handle(&save_path, Some(body.trim())).await? {
                Some(stored) => println!("{stored}"),
                None => eprintln!("No payload in {}", data_url.display()),
            }
        }
        Some(Commands::Avatar { id, out }) => {
            let asset = palaver_cdn::create_avatar_resolver(&cdn).resolve(&id).await?;
            tokio::fs::write(&out, &asset.bytes)
                .await
                .with_context(|| format!("writing {}", out.display()))?;
            eprintln!(
                "Wrote avatar {id} ({}, {} bytes) to {}",
                asset.content_type,
                asset.bytes.len(),
                out.display()
            );
        }
        None => {
            let db = palaver_db::open_database(&cli.config.db()).await?;
            let avatars = palaver_cdn::create_avatar_resolver(&cdn);

            let addr = cli.config.addr();
            let listener = TcpListener::bind(addr).await?;
            tracing::info!(%addr, assets_root = %avatars.assets_root().display(), "palaver-server listening");

            palaver_server::serve(listener, db, avatars).await?;
        }
    }

    Ok(())
}
