//! gRPC service implementation for the product catalog.
//!
//! This module defines [`CatalogService`], the concrete implementation of the
//! [`ProductService`] gRPC service defined in the protobuf schema.
//!
//! ## Responsibilities
//!
//! - `Fetch`: run CSV ingestion for the requested URL.
//! - `List`: spawn one task per bidirectional stream that answers every
//!   inbound `Filters` message with exactly one `ListResponse`.
//! - Track in-flight streams, refuse new ones during shutdown, and cancel the
//!   stragglers once the drain period is over.

use crate::server::{
    config::ServerConfig,
    service::{catalog::ProductCatalog, config::product_sort_config},
    streaming::coordinator::serve_list,
    telemetry::{
        decrement_streams_inflight, increment_fetch_errors, increment_list_requests,
        increment_products_ingested, increment_stream_errors, increment_streams_inflight,
        record_stream_duration,
    },
};
use catalog_core::{
    Error,
    filters::SortConfig,
    proto::{
        FetchRequest, FetchResponse, Filters, ListResponse,
        product_service_server::{ProductService, ProductServiceServer},
    },
};
use core::{pin::Pin, time::Duration};
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use tokio::{
    sync::mpsc,
    time::{sleep, timeout},
};
use tokio_stream::{Stream, wrappers::ReceiverStream};
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status, Streaming, codec::CompressionEncoding};

/// gRPC front of the product catalog.
///
/// Clones share the same catalog, shutdown token and stream accounting, so
/// the clone handed to the router and the one kept for shutdown agree.
#[derive(Clone)]
pub struct CatalogService {
    config: ServerConfig,
    catalog: ProductCatalog,
    sort: SortConfig,
    shutdown_token: CancellationToken,
    refusing: Arc<AtomicBool>,
    inflight: Arc<AtomicUsize>,
}

/// Releases one in-flight slot when a stream task ends, however it ends.
struct InflightGuard(Arc<AtomicUsize>);

impl InflightGuard {
    fn acquire(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        increment_streams_inflight();
        Self(Arc::clone(counter))
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
        decrement_streams_inflight();
    }
}

impl CatalogService {
    pub fn new(config: ServerConfig, catalog: ProductCatalog) -> Self {
        Self {
            config,
            catalog,
            sort: product_sort_config(),
            shutdown_token: CancellationToken::new(),
            refusing: Arc::new(AtomicBool::new(false)),
            inflight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `List` streams whose task is still running.
    pub fn streams_inflight(&self) -> usize {
        self.inflight.load(Ordering::Acquire)
    }

    /// Gracefully shuts the service down.
    ///
    /// - Refuses new `List` streams with `UNAVAILABLE`.
    /// - Waits up to the configured shutdown timeout for in-flight streams to
    ///   finish on their own.
    /// - Cancels whatever is left; those clients receive `UNAVAILABLE`.
    pub async fn shutdown(&self) {
        // === Phase 0: Stop accepting new streams ===
        #[cfg(feature = "tracing")]
        tracing::info!("Refusing new streams");
        self.refusing.store(true, Ordering::Release);

        // === Phase 1: Wait for in-flight streams to drain ===
        #[cfg(feature = "tracing")]
        tracing::info!(
            "Draining in-flight streams ({} active)",
            self.streams_inflight()
        );
        let drain_result = timeout(self.config.shutdown_timeout, async {
            while self.streams_inflight() > 0 {
                sleep(Duration::from_millis(100)).await;
            }
        })
        .await;

        match drain_result {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("All in-flight streams drained successfully");
            }
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    "Graceful drain timed out ({} streams still active)",
                    self.streams_inflight()
                );
            }
        }

        // === Phase 2: Cancel any remaining streams ===
        #[cfg(feature = "tracing")]
        tracing::debug!("Cancelling remaining streams via shutdown token");
        self.shutdown_token.cancel();
    }
}

/// Wraps `service` in the generated server, accepting and offering zstd, gzip
/// and deflate compression.
pub fn build_catalog_server(service: CatalogService) -> ProductServiceServer<CatalogService> {
    ProductServiceServer::new(service)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Deflate)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Deflate)
}

#[tonic::async_trait]
impl ProductService for CatalogService {
    type ListStream = Pin<Box<dyn Stream<Item = Result<ListResponse, Status>> + Send>>;

    /// Downloads the CSV feed at `url` and upserts every product in it.
    ///
    /// Errors map to `INVALID_ARGUMENT` (bad URL or undecodable feed),
    /// `NOT_FOUND` (download failed) and `UNKNOWN` (upsert failed).
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(url = %req.get_ref().url)))]
    async fn fetch(&self, req: Request<FetchRequest>) -> Result<Response<FetchResponse>, Status> {
        let url = req.into_inner().url;

        match self.catalog.ingest(&url).await {
            Ok(count) => {
                increment_products_ingested(count as u64);
                #[cfg(feature = "tracing")]
                tracing::info!("Ingested {} products", count);
                Ok(Response::new(FetchResponse {}))
            }
            Err(e) => {
                increment_fetch_errors();
                #[cfg(feature = "tracing")]
                tracing::warn!("Ingestion failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Opens a listing stream.
    ///
    /// If `metrics` is enabled, emits telemetry for:
    /// - stream rate
    /// - concurrent stream count
    /// - stream duration
    /// - stream errors
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    async fn list(
        &self,
        req: Request<Streaming<Filters>>,
    ) -> Result<Response<Self::ListStream>, Status> {
        if self.refusing.load(Ordering::Acquire) || self.shutdown_token.is_cancelled() {
            increment_stream_errors();
            return Err(Error::ServiceShutdown.into());
        }

        let start = std::time::Instant::now();
        increment_list_requests();
        let guard = InflightGuard::acquire(&self.inflight);

        let (resp_tx, resp_rx) =
            mpsc::channel::<Result<ListResponse, Status>>(self.config.stream_buffer_size);

        let stream_loop = serve_list(
            req.into_inner(),
            self.catalog.clone(),
            self.sort.clone(),
            resp_tx,
            self.shutdown_token.clone(),
        );

        let fut = async move {
            let _guard = guard;
            match stream_loop.await {
                Ok(()) => {
                    record_stream_duration(start.elapsed().as_millis() as f64);
                }
                Err(_e) => {
                    increment_stream_errors();
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Stream ended: {}", _e);
                }
            }
        };
        #[cfg(feature = "tracing")]
        let fut = {
            use tracing::Instrument;
            let span = tracing::info_span!("streaming");
            fut.instrument(span)
        };

        tokio::spawn(fut);

        Ok(Response::new(Box::pin(ReceiverStream::new(resp_rx))))
    }
}
