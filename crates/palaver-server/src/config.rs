use std::net::{IpAddr, SocketAddr};

use clap::Args;
use palaver_cdn::CdnConfig;
use palaver_db::DbConfig;

/// Server and storage settings. Every flag can also come from the
/// environment.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    #[arg(long, env = "PALAVER_BIND", default_value = "0.0.0.0", global = true)]
    pub bind: IpAddr,

    #[arg(long, env = "PALAVER_PORT", default_value_t = 3000, global = true)]
    pub port: u16,

    /// SQLite database file. Defaults to the user data directory.
    #[arg(long, env = "PALAVER_DB_PATH", global = true)]
    pub db_path: Option<String>,

    /// Postgres connection URL; takes precedence over `--db-path`.
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// Private endpoint of the storage service.
    #[arg(
        long,
        env = "PALAVER_CDN_ENDPOINT_PRIVATE",
        default_value = palaver_cdn::DEFAULT_ENDPOINT_PRIVATE,
        global = true
    )]
    pub cdn_endpoint: String,

    /// Shared secret sent to the storage service.
    #[arg(
        long,
        env = "PALAVER_REQUEST_SIGNATURE",
        default_value = "",
        hide_env_values = true,
        global = true
    )]
    pub request_signature: String,

    #[arg(
        long,
        env = "PALAVER_PUBLIC_ROOT",
        default_value = palaver_cdn::DEFAULT_PUBLIC_ROOT,
        global = true
    )]
    pub public_root: String,

    #[arg(
        long,
        env = "PALAVER_ASSETS_ROOT",
        default_value = palaver_cdn::DEFAULT_ASSETS_ROOT,
        global = true
    )]
    pub assets_root: String,
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn db(&self) -> DbConfig {
        DbConfig {
            sqlite_path: self.db_path.clone(),
            database_url: self.database_url.clone(),
        }
    }

    pub fn cdn(&self) -> CdnConfig {
        CdnConfig {
            endpoint_private: Some(self.cdn_endpoint.clone()),
            request_signature: self.request_signature.clone(),
            public_root: Some(self.public_root.clone()),
            assets_root: Some(self.assets_root.clone()),
        }
    }
}
