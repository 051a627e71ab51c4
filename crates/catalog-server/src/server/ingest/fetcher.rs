use bytes::{Bytes, BytesMut};
use catalog_core::{Error, Result};
use core::time::Duration;
use reqwest::Url;

/// Downloads the raw body of a CSV feed.
#[tonic::async_trait]
pub trait Fetcher: Send + Sync + 'static {
    /// Returns the full response body for `url`.
    ///
    /// # Errors
    ///
    /// [`Error::UpstreamFetch`] on transport failure, timeout, or a non-success
    /// HTTP status.
    async fn fetch(&self, url: &Url) -> Result<Bytes>;
}

/// [`Fetcher`] issuing plain `GET` requests through a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
    max_body_bytes: u64,
}

impl HttpFetcher {
    /// Builds a client whose requests are abandoned after `timeout` and whose
    /// response bodies may not exceed `max_body_bytes`.
    pub fn new(timeout: Duration, max_body_bytes: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("catalog-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::UpstreamFetch {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            max_body_bytes,
        })
    }

    fn too_large(&self, url: &Url) -> Error {
        Error::UpstreamFetch {
            reason: format!("GET {url}: body exceeds {} bytes", self.max_body_bytes),
        }
    }
}

fn upstream(url: &Url, e: &reqwest::Error) -> Error {
    Error::UpstreamFetch {
        reason: format!("GET {url}: {e}"),
    }
}

#[tonic::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes> {
        let mut response = self
            .http
            .get(url.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| upstream(url, &e))?;

        if response
            .content_length()
            .is_some_and(|len| len > self.max_body_bytes)
        {
            return Err(self.too_large(url));
        }

        // Content-Length may be absent (chunked) or wrong, so count as we go.
        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| upstream(url, &e))? {
            if (body.len() + chunk.len()) as u64 > self.max_body_bytes {
                return Err(self.too_large(url));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    /// Answers a single HTTP request with `response` verbatim.
    async fn serve_once(response: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            // The client may hang up early once it has seen enough.
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });

        Url::parse(&format!("http://{addr}/products.csv")).unwrap()
    }

    fn fetcher(max_body_bytes: u64) -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(5), max_body_bytes).unwrap()
    }

    #[tokio::test]
    async fn returns_body_within_cap() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 31\r\nConnection: close\r\n\r\n\
             PRODUCT NAME;PRICE\nWidget;1000\n",
        )
        .await;

        let body = fetcher(64).fetch(&url).await.unwrap();
        assert_eq!(&body[..], b"PRODUCT NAME;PRICE\nWidget;1000\n");
    }

    #[tokio::test]
    async fn declared_length_over_cap_is_rejected() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 31\r\nConnection: close\r\n\r\n\
             PRODUCT NAME;PRICE\nWidget;1000\n",
        )
        .await;

        let err = fetcher(16).fetch(&url).await.unwrap_err();
        assert!(matches!(err, Error::UpstreamFetch { .. }));
        assert!(err.to_string().contains("exceeds 16 bytes"), "{err}");
    }

    #[tokio::test]
    async fn chunked_body_over_cap_is_rejected() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n\
             13\r\nPRODUCT NAME;PRICE\n\r\n\
             c\r\nWidget;1000\n\r\n\
             0\r\n\r\n",
        )
        .await;

        let err = fetcher(20).fetch(&url).await.unwrap_err();
        assert!(err.to_string().contains("exceeds 20 bytes"), "{err}");
    }

    #[tokio::test]
    async fn error_status_is_a_fetch_failure() {
        let url = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;

        let err = fetcher(64).fetch(&url).await.unwrap_err();
        assert!(matches!(err, Error::UpstreamFetch { .. }));
        assert!(err.to_string().contains("404"), "{err}");
    }
}
