//! Server configuration, read from the environment via `clap`'s `env`
//! feature, one `#[arg(env = "...")]` per variable.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Gophkeeper identity vault server")]
pub struct Args {
    /// Listen address.
    #[arg(long, env = "REST_ADDRESS", default_value = "0.0.0.0:16355")]
    pub rest_address: SocketAddr,

    /// Whether TLS/ACME was requested. ACME bootstrap is out of scope here;
    /// the server always serves plaintext HTTP and logs accordingly.
    #[arg(long, env = "REST_USE_TLS", default_value_t = true)]
    pub rest_use_tls: bool,

    /// Raw-base64-encoded MAC key for bearer tokens.
    #[arg(long, env = "TOKEN_SECRET")]
    pub token_secret: String,

    /// Token validity window, in seconds.
    #[arg(long, env = "TOKEN_LIFESPAN", default_value_t = 900)]
    pub token_lifespan_secs: u64,

    #[arg(long, env = "USERNAME_MIN_LENGTH", default_value_t = 0)]
    pub username_min_length: usize,

    #[arg(long, env = "PASSWORD_MIN_LENGTH", default_value_t = 0)]
    pub password_min_length: usize,

    /// SQLite connection string, or `:memory:`.
    #[arg(long, env = "DATABASE_DSN")]
    pub database_dsn: String,

    /// Root of blob storage. Defaults to `$CWD/blobs`.
    #[arg(long, env = "BLOBS_DIR")]
    pub blobs_dir: Option<PathBuf>,
}

/// Resolved server configuration, derived from [`Args`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub rest_address: SocketAddr,
    pub rest_use_tls: bool,
    pub token_secret: Vec<u8>,
    pub token_lifespan_secs: u64,
    pub username_min_length: usize,
    pub password_min_length: usize,
    pub database_dsn: String,
    pub blobs_dir: PathBuf,
}

impl ServerConfig {
    pub fn from_args(args: Args) -> anyhow::Result<Self> {
        use base64::Engine;

        let token_secret = base64::engine::general_purpose::STANDARD
            .decode(args.token_secret.as_bytes())
            .map_err(|err| anyhow::anyhow!("TOKEN_SECRET is not valid base64: {err}"))?;

        let blobs_dir = match args.blobs_dir {
            Some(dir) => dir,
            None => std::env::current_dir()?.join("blobs"),
        };

        Ok(Self {
            rest_address: args.rest_address,
            rest_use_tls: args.rest_use_tls,
            token_secret,
            token_lifespan_secs: args.token_lifespan_secs,
            username_min_length: args.username_min_length,
            password_min_length: args.password_min_length,
            database_dsn: args.database_dsn,
            blobs_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn blobs_dir_defaults_to_cwd_join_blobs() {
        let args = Args::parse_from([
            "gophkeeper-server",
            "--token-secret",
            "aGVsbG8=",
            "--database-dsn",
            ":memory:",
        ]);
        let config = ServerConfig::from_args(args).unwrap();
        assert_eq!(config.blobs_dir, std::env::current_dir().unwrap().join("blobs"));
    }

    #[test]
    fn rejects_non_base64_token_secret() {
        let args = Args::parse_from([
            "gophkeeper-server",
            "--token-secret",
            "not base64!!",
            "--database-dsn",
            ":memory:",
        ]);
        assert!(ServerConfig::from_args(args).is_err());
    }
}
