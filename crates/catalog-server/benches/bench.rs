use catalog_core::{
    proto::{Filters, product_service_client::ProductServiceClient},
    types::ProductRecord,
};
use catalog_server::server::{
    config::ServerConfig,
    ingest::fetcher::HttpFetcher,
    service::{
        catalog::ProductCatalog,
        handler::{CatalogService, build_catalog_server},
    },
    storage::{ProductRepository, memory::MemoryProductStore},
};
use core::{fmt, hint::black_box};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use futures::stream::FuturesUnordered;
use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{net::TcpListener, runtime::Builder};
use tokio_stream::{StreamExt, wrappers::TcpListenerStream};
use tonic::{
    codec::CompressionEncoding,
    transport::{Channel, Uri},
};

const CATALOG_SIZE: usize = 10_000;

#[derive(Clone, Copy, Debug)]
enum Compression {
    None,
    Deflate,
    Gzip,
    Zstd,
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Deflate => write!(f, "deflate"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Zstd => write!(f, "zstd"),
        }
    }
}

impl From<Compression> for Option<CompressionEncoding> {
    fn from(value: Compression) -> Self {
        match value {
            Compression::None => None,
            Compression::Deflate => Some(CompressionEncoding::Deflate),
            Compression::Gzip => Some(CompressionEncoding::Gzip),
            Compression::Zstd => Some(CompressionEncoding::Zstd),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct ListBenchParams {
    pages_per_stream: u64,
    page_size: i64,
    concurrency: usize,
    compression: Compression,
}

async fn start_server() -> SocketAddr {
    let store = MemoryProductStore::new();
    let records: Vec<_> = (0..CATALOG_SIZE)
        .map(|i| ProductRecord::new(format!("product-{i:05}"), (i * 7 % 1000) as i64))
        .collect();
    store
        .update_or_create(&records)
        .await
        .expect("failed to seed catalog");

    let fetcher = HttpFetcher::new(Duration::from_secs(5), 1024 * 1024).expect("failed to build fetcher");
    let catalog = ProductCatalog::new(Arc::new(store), Arc::new(fetcher));
    let config = ServerConfig {
        server_addr: "127.0.0.1:0".to_owned(),
        uds: false,
        stream_buffer_size: 8,
        fetch_timeout: Duration::from_secs(5),
        fetch_max_bytes: 1024 * 1024,
        database_url: None,
        db_max_connections: 1,
        shutdown_timeout: Duration::ZERO,
    };
    let service = CatalogService::new(config, catalog);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind");
    let addr = listener.local_addr().expect("missing local addr");
    tokio::spawn(
        tonic::transport::Server::builder()
            .add_service(build_catalog_server(service))
            .serve_with_incoming(TcpListenerStream::new(listener)),
    );
    addr
}

fn grpc_bench(c: &mut Criterion) {
    let rt = Builder::new_multi_thread().enable_all().build().unwrap();
    let addr = rt.block_on(start_server());
    let uri = Uri::try_from(format!("http://{addr}")).expect("Invalid URI");

    let pages_per_stream_cases = [1, 100, 1_000];
    let page_size_cases = [10, 100];
    let concurrency_cases = [1, 4, 16];
    let compression_cases = [
        Compression::None,
        Compression::Zstd,
        Compression::Gzip,
        Compression::Deflate,
    ];

    // Generate cartesian product of all param combinations
    let mut cases = Vec::new();
    for &pages_per_stream in &pages_per_stream_cases {
        for &page_size in &page_size_cases {
            for &concurrency in &concurrency_cases {
                for &compression in &compression_cases {
                    cases.push(ListBenchParams {
                        pages_per_stream,
                        page_size,
                        concurrency,
                        compression,
                    });
                }
            }
        }
    }

    for params in &cases {
        let mut group = c.benchmark_group("grpc/list");
        group.throughput(Throughput::Elements(
            params.pages_per_stream * params.concurrency as u64,
        ));

        group.bench_function(
            format!(
                "pages/{}/size/{}/conc/{}/comp/{}",
                params.pages_per_stream, params.page_size, params.concurrency, params.compression,
            ),
            |b| {
                b.to_async(&rt).iter_custom(|iters| {
                    let uri = uri.clone();
                    async move {
                        let channel = Channel::builder(uri)
                            .connect()
                            .await
                            .expect("Failed to connect to server");

                        let start = Instant::now();

                        for _ in 0..iters {
                            run_list_bench(&channel, params).await;
                        }

                        start.elapsed()
                    }
                });
            },
        );

        group.finish();
    }
}

async fn run_list_bench(channel: &Channel, params: &ListBenchParams) {
    let mut tasks = FuturesUnordered::new();

    for _ in 0..params.concurrency {
        let channel = channel.clone();
        let params = *params;

        tasks.push(tokio::spawn(async move {
            let mut client = ProductServiceClient::new(channel);
            if let Some(encoding) = params.compression.into() {
                client = client.accept_compressed(encoding).send_compressed(encoding)
            }

            let last_page = (CATALOG_SIZE as i64 / params.page_size).max(1);
            let requests = (0..params.pages_per_stream).map(move |i| Filters {
                page: (i as i64 % last_page) + 1,
                page_size: params.page_size,
                sort: if i % 2 == 0 { "price" } else { "-name" }.to_owned(),
            });

            let mut stream = client
                .list(tokio_stream::iter(requests))
                .await
                .expect("stream call failed")
                .into_inner();

            while let Some(resp) = stream.next().await {
                let page = resp.expect("resp");
                assert!(page.error.is_none(), "rejected filters");
                black_box(page);
            }
        }));
    }

    // Wait for all tasks to complete
    while let Some(res) = tasks.next().await {
        res.unwrap();
    }
}

criterion_group!(grpc_benches, grpc_bench);
criterion_main!(grpc_benches);
