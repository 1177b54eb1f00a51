//! TCP front end of the ticket service.
//!
//! One task per connection. Each task reads request lines, runs the matching
//! [`TicketService`] operation and writes one response line back. A transport
//! error only ends its own connection.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::{LinesStream, TcpListenerStream};
use tracing::{debug, info, warn};

use crate::TicketService;
use crate::protocol::{Request, Response, ResponseData};

/// Connected clients, keyed by a per-process connection id.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    inner: Mutex<Registry>,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    clients: HashMap<u64, ClientInfo>,
}

/// Bookkeeping for one connection.
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub peer: String,
    pub connected_at: DateTime<Utc>,
}

impl ClientRegistry {
    /// Record a new connection and return its id.
    pub fn register(&self, peer: String) -> u64 {
        let mut registry = self.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.clients.insert(
            id,
            ClientInfo {
                peer,
                connected_at: Utc::now(),
            },
        );
        id
    }

    pub fn unregister(&self, id: u64) -> Option<ClientInfo> {
        self.lock().clients.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Accept connections forever, one task each.
pub async fn serve(listener: TcpListener, service: Arc<TicketService>) {
    let clients = Arc::new(ClientRegistry::default());
    let mut incoming = TcpListenerStream::new(listener);

    while let Some(conn) = incoming.next().await {
        let stream = match conn {
            Ok(stream) => stream,
            Err(e) => {
                // accept errors are per-connection, keep listening
                warn!(error = %e, "failed to accept connection");
                continue;
            }
        };
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        tokio::spawn(handle_connection(
            stream,
            peer,
            Arc::clone(&service),
            Arc::clone(&clients),
        ));
    }
}

/// Serve one client until it disconnects or the transport fails.
pub async fn handle_connection<S>(
    stream: S,
    peer: String,
    service: Arc<TicketService>,
    clients: Arc<ClientRegistry>,
) where
    S: AsyncRead + AsyncWrite,
{
    let client_id = clients.register(peer.clone());
    info!(%peer, clients = clients.len(), "client connected");

    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = LinesStream::new(BufReader::new(reader).lines());

    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(%peer, error = %e, "failed to read request");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = respond(&service, &line);
        if let Err(e) = write_response(&mut writer, &response).await {
            warn!(%peer, error = %e, "failed to write response");
            break;
        }
    }

    clients.unregister(client_id);
    info!(%peer, clients = clients.len(), "client disconnected");
}

/// Map one request line to its response.
pub fn respond(service: &TicketService, line: &str) -> Response {
    let request = match Request::decode(line) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "rejected request");
            return Response::error(e);
        }
    };
    debug!(kind = %request.kind(), "request decoded");

    match request {
        Request::QueryTicket => {
            Response::ok("query ok", Some(ResponseData::Train(service.query_ticket())))
        }
        Request::BuyTicket(req) => match service.buy_ticket(&req.passenger) {
            Ok(()) => Response::ok("ticket purchased", None),
            Err(e) => Response::error(e),
        },
        Request::WaitList(req) => {
            let order = service.add_to_wait_list(req.passenger, req.train_id, req.date);
            Response::ok("added to waitlist", Some(ResponseData::Order(order)))
        }
        Request::CheckWait(req) => match service.check_wait_position(req.order_id) {
            Ok(order) => Response::ok("query ok", Some(ResponseData::Order(order))),
            Err(e) => Response::error(e),
        },
        Request::Refund => match service.process_refund() {
            Ok(Some(order)) => Response::ok(
                format!("refund processed, {} promoted", order.order_id),
                None,
            ),
            Ok(None) => Response::ok("refund processed", None),
            Err(e) => Response::error(e),
        },
    }
}

async fn write_response<W>(writer: &mut W, response: &Response) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = response.encode()?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}
