use super::processor::process_filters;
use crate::server::service::catalog::ProductCatalog;
use catalog_core::{
    Error,
    filters::SortConfig,
    proto::{self, ListResponse},
};
use core::pin::pin;
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tonic::Status;

/// Drives one `List` stream until the client finishes, the client goes away,
/// or the service shuts down.
///
/// Each inbound message is answered with exactly one outbound message, and
/// the next inbound message is only read once that answer has been handed to
/// `resp_tx`. Responses therefore leave in request order.
///
/// # Behavior
///
/// - End of input returns `Ok(())`.
/// - A receive failure is forwarded to the client and ends the stream with
///   [`Error::StreamClosed`].
/// - A storage failure is forwarded to the client (`UNKNOWN`) and ends the
///   stream.
/// - A closed outbound channel means the client is gone:
///   [`Error::RequestCancelled`] while waiting, [`Error::ChannelError`] if it
///   happens during a send.
/// - Cancelling `shutdown` returns [`Error::ServiceShutdown`] from any
///   suspension point, including a send blocked on a client that stopped
///   reading. `UNAVAILABLE` is delivered if the outbound buffer has room.
pub async fn serve_list<S>(
    inbound: S,
    catalog: ProductCatalog,
    sort: SortConfig,
    resp_tx: mpsc::Sender<Result<ListResponse, Status>>,
    shutdown: CancellationToken,
) -> catalog_core::Result<()>
where
    S: Stream<Item = Result<proto::Filters, Status>> + Send,
{
    let mut inbound = pin!(inbound);

    loop {
        let next = tokio::select! {
            biased;
            () = shutdown.cancelled() => return shut_down(&resp_tx),
            () = resp_tx.closed() => return Err(Error::RequestCancelled),
            next = inbound.next() => next,
        };

        let request = match next {
            None => return Ok(()),
            Some(Ok(request)) => request,
            Some(Err(status)) => {
                let reason = status.message().to_owned();
                forward(&resp_tx, status, &shutdown).await;
                return Err(Error::StreamClosed { reason });
            }
        };

        let outcome = tokio::select! {
            biased;
            () = shutdown.cancelled() => return shut_down(&resp_tx),
            () = resp_tx.closed() => return Err(Error::RequestCancelled),
            outcome = process_filters(&catalog, &sort, request) => outcome,
        };

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                forward(&resp_tx, e.clone().into(), &shutdown).await;
                return Err(e);
            }
        };

        // `send` waits for buffer space, so it must stay cancellable.
        tokio::select! {
            biased;
            () = shutdown.cancelled() => return shut_down(&resp_tx),
            sent = resp_tx.send(Ok(response)) => {
                if let Err(e) = sent {
                    return Err(Error::ChannelError {
                        context: format!("Failed to forward page: {e}"),
                    });
                }
            }
        }
    }
}

/// Tells the client the service is going away without waiting on it.
fn shut_down(resp_tx: &mpsc::Sender<Result<ListResponse, Status>>) -> catalog_core::Result<()> {
    if let Err(_e) = resp_tx.try_send(Err(Error::ServiceShutdown.into())) {
        #[cfg(feature = "tracing")]
        tracing::debug!("Shutdown status not delivered: {}", _e);
    }
    Err(Error::ServiceShutdown)
}

/// Best effort: the client may already have disconnected, or may never read
/// again before shutdown.
async fn forward(
    resp_tx: &mpsc::Sender<Result<ListResponse, Status>>,
    status: Status,
    shutdown: &CancellationToken,
) {
    tokio::select! {
        biased;
        () = shutdown.cancelled() => {
            #[cfg(feature = "tracing")]
            tracing::debug!("Dropped stream error during shutdown");
        }
        sent = resp_tx.send(Err(status)) => {
            if let Err(_e) = sent {
                #[cfg(feature = "tracing")]
                tracing::warn!("Failed to forward err: {}", _e);
            }
        }
    }
}
