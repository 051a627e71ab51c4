use catalog_core::proto::{FILE_DESCRIPTOR_SET, product_service_server::ProductServiceServer};
use catalog_server::server::{
    config::{CliArgs, ServerConfig},
    ingest::fetcher::HttpFetcher,
    service::{
        catalog::ProductCatalog,
        handler::{CatalogService, build_catalog_server},
    },
    storage,
    telemetry::{TelemetryProviders, init_telemetry},
};
use clap::Parser;
use futures::Stream;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::transport::server::Connected;
use tonic_health::server::HealthReporter;
use tonic_reflection::server::Builder;
use tonic_web::GrpcWebLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;
    let service = build_service(&config).await?;

    if config.uds {
        #[cfg(unix)]
        {
            use tokio::net::UnixListener;
            use tokio_stream::wrappers::UnixListenerStream;
            let uds_path = config.server_addr.clone();
            let uds = UnixListener::bind(&uds_path)?;
            let incoming = UnixListenerStream::new(uds);
            log_startup_info(&uds_path, &config);
            let res = run_server_with_incoming(providers, incoming, service).await;
            // A panic may still leave the socket file behind.
            let _ = std::fs::remove_file(&uds_path);
            res
        }
        #[cfg(not(unix))]
        {
            anyhow::bail!("Unix domain sockets are not supported on this platform");
        }
    } else {
        let tcp_path = config.server_addr.clone();
        let tcp = TcpListener::bind(&tcp_path).await?;
        let incoming = TcpListenerStream::new(tcp);
        log_startup_info(&tcp_path, &config);
        run_server_with_incoming(providers, incoming, service).await
    }
}

async fn build_service(config: &ServerConfig) -> anyhow::Result<CatalogService> {
    let repo = storage::open(config.database_url.as_deref(), config.db_max_connections).await?;
    let fetcher = Arc::new(HttpFetcher::new(config.fetch_timeout, config.fetch_max_bytes)?);
    let catalog = ProductCatalog::new(repo, fetcher);

    Ok(CatalogService::new(config.clone(), catalog))
}

async fn run_server_with_incoming<I, IO, IE>(
    providers: TelemetryProviders,
    incoming: I,
    service: CatalogService,
) -> anyhow::Result<()>
where
    I: Stream<Item = Result<IO, IE>>,
    IO: AsyncRead + AsyncWrite + Connected + Unpin + Send + 'static,
    IE: Into<tower::BoxError>,
{
    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<ProductServiceServer<CatalogService>>()
        .await;

    let reflection = Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    Server::builder()
        .accept_http1(true)
        .http2_adaptive_window(Some(true))
        .layer(
            ServiceBuilder::new()
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(GrpcWebLayer::new()),
        )
        .add_service(health_service)
        .add_service(reflection)
        .add_service(build_catalog_server(service.clone()))
        .serve_with_incoming_shutdown(
            incoming,
            shutdown_signal(service, health_reporter, providers),
        )
        .await?;

    #[cfg(feature = "tracing")]
    tracing::info!("Service shut down successfully");
    Ok(())
}

fn log_startup_info(_addr: &str, _config: &ServerConfig) {
    if cfg!(debug_assertions) {
        #[cfg(feature = "tracing")]
        tracing::info!(
            "Starting catalog service on {} with full config: {:#?}",
            _addr,
            _config
        );
    } else {
        #[cfg(feature = "tracing")]
        tracing::info!(
            "Starting catalog service on {} ({} store)",
            _addr,
            if _config.database_url.is_some() {
                "sqlite"
            } else {
                "in-memory"
            }
        );
    }
}

async fn shutdown_signal(
    service: CatalogService,
    health_reporter: HealthReporter,
    providers: TelemetryProviders,
) {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => {
            #[cfg(feature = "tracing")]
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            #[cfg(feature = "tracing")]
            tracing::info!("Received SIGTERM signal");
        },
    }

    #[cfg(feature = "tracing")]
    tracing::info!("Shutdown signal received, terminating gracefully...");

    // 1. Publish the status
    health_reporter
        .set_not_serving::<ProductServiceServer<CatalogService>>()
        .await;

    // 2. Drain and cancel in-flight streams
    service.shutdown().await;

    // 3. Flush exporters
    providers.shutdown();
}
