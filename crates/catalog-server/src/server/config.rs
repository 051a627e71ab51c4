use anyhow::bail;
use clap::Parser;
use core::time::Duration;

/// Runtime configuration for the `catalog-server` binary.
///
/// Every setting is read from a CLI flag or the matching environment variable
/// (a `.env` file in the working directory is loaded first).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "catalog-server",
    version,
    about = "A gRPC product catalog with CSV ingestion and streamed listings"
)]
pub struct CliArgs {
    /// Address to listen on (TCP or Unix socket path; use --uds for Unix socket).
    ///
    /// Example: "0.0.0.0:50051" or "/tmp/catalog.sock"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:50051"))]
    pub server_addr: String,

    /// Listen on a Unix socket instead of TCP. If set, `SERVER_ADDR` must be a file path.
    #[arg(short, long, default_value_t = false)]
    pub uds: bool,

    /// Capacity of the outbound buffer of each `List` stream.
    ///
    /// Each inbound request produces exactly one response, so this only bounds
    /// how far the server may run ahead of a slow reader.
    ///
    /// Environment variable: `STREAM_BUFFER_SIZE`
    #[arg(long, env = "STREAM_BUFFER_SIZE", default_value_t = 8)]
    pub stream_buffer_size: usize,

    /// Request timeout, in seconds, for downloading a CSV feed.
    ///
    /// Environment variable: `FETCH_TIMEOUT_SECS`
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 30)]
    pub fetch_timeout_secs: u64,

    /// Largest CSV feed body, in bytes, the server will download.
    ///
    /// Environment variable: `FETCH_MAX_BYTES`
    #[arg(long, env = "FETCH_MAX_BYTES", default_value_t = 16 * 1024 * 1024)]
    pub fetch_max_bytes: u64,

    /// SQLite connection URL, e.g. `sqlite://catalog.db`. Products are kept
    /// in memory when unset.
    ///
    /// Environment variable: `DATABASE_URL`
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Upper bound on pooled database connections.
    ///
    /// Environment variable: `DB_MAX_CONNECTIONS`
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub db_max_connections: u32,

    /// Seconds granted to in-flight streams to finish after a shutdown signal
    /// before they are cancelled.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 3)]
    pub shutdown_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub uds: bool,
    pub stream_buffer_size: usize,
    pub fetch_timeout: Duration,
    pub fetch_max_bytes: u64,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub shutdown_timeout: Duration,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.stream_buffer_size == 0 {
            bail!("STREAM_BUFFER_SIZE must be greater than 0");
        }

        if args.fetch_timeout_secs == 0 {
            bail!("FETCH_TIMEOUT_SECS must be greater than 0");
        }

        if args.fetch_max_bytes == 0 {
            bail!("FETCH_MAX_BYTES must be greater than 0");
        }

        if args.db_max_connections == 0 {
            bail!("DB_MAX_CONNECTIONS must be greater than 0");
        }

        let database_url = args.database_url.filter(|url| !url.trim().is_empty());

        #[cfg(not(feature = "sqlite"))]
        if database_url.is_some() {
            bail!("DATABASE_URL is set but the server was built without the `sqlite` feature");
        }

        Ok(Self {
            server_addr: args.server_addr,
            uds: args.uds,
            stream_buffer_size: args.stream_buffer_size,
            fetch_timeout: Duration::from_secs(args.fetch_timeout_secs),
            fetch_max_bytes: args.fetch_max_bytes,
            database_url,
            db_max_connections: args.db_max_connections,
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> anyhow::Result<ServerConfig> {
        let args = CliArgs::try_parse_from(
            ["catalog-server", "--server-addr", "127.0.0.1:0"]
                .into_iter()
                .chain(extra.iter().copied()),
        )?;
        ServerConfig::try_from(args)
    }

    #[test]
    fn zero_buffer_is_rejected() {
        let err = parse(&["--stream-buffer-size", "0"]).unwrap_err();
        assert!(err.to_string().contains("STREAM_BUFFER_SIZE"));
    }

    #[test]
    fn zero_fetch_timeout_is_rejected() {
        let err = parse(&["--fetch-timeout-secs", "0"]).unwrap_err();
        assert!(err.to_string().contains("FETCH_TIMEOUT_SECS"));
    }

    #[test]
    fn zero_body_cap_is_rejected() {
        let err = parse(&["--fetch-max-bytes", "0"]).unwrap_err();
        assert!(err.to_string().contains("FETCH_MAX_BYTES"));
    }

    #[test]
    fn zero_db_connections_are_rejected() {
        let err = parse(&["--db-max-connections", "0"]).unwrap_err();
        assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));
    }

    #[test]
    fn blank_database_url_means_memory_store() {
        let config = parse(&["--database-url", "  "]).unwrap();
        assert!(config.database_url.is_none());
    }

    #[test]
    fn durations_are_seconds() {
        let config = parse(&["--fetch-timeout-secs", "12", "--shutdown-timeout", "0"]).unwrap();
        assert_eq!(config.fetch_timeout, Duration::from_secs(12));
        assert_eq!(config.shutdown_timeout, Duration::ZERO);
        assert_eq!(config.server_addr, "127.0.0.1:0");
    }
}
