use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use crate::http::parser::{parse_http_request, ParseError};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::router::Router;

const READ_CHUNK: usize = 4096;

/// One client session: reads requests, asks the router, writes responses.
///
/// Generic over the stream so it can run on a `TcpStream` or an in-memory
/// duplex pipe.
pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    router: Arc<dyn Router>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter, bool), // bool = keep_alive?
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, router: Arc<dyn Router>) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            router,
            state: ConnectionState::Reading,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => {
                    self.state = match self.read_request().await {
                        Ok(Some(req)) => ConnectionState::Processing(req),
                        Ok(None) => ConnectionState::Closed,
                        Err(ReadError::Malformed(e)) => {
                            tracing::debug!(error = ?e, "Malformed request");
                            let response = match e {
                                ParseError::BodyTooLarge => Response::payload_too_large(),
                                _ => Response::bad_request(),
                            };
                            let writer = ResponseWriter::new(&response, false);
                            ConnectionState::Writing(writer, false)
                        }
                        Err(ReadError::Io(e)) => return Err(e.into()),
                    };
                }

                ConnectionState::Processing(req) => {
                    let response = self.router.route(req);
                    let keep_alive = req.keep_alive();

                    tracing::debug!(
                        method = ?req.method,
                        path = %req.path,
                        status = response.status.as_u16(),
                        "Request handled"
                    );

                    let writer = ResponseWriter::new(&response, keep_alive);
                    self.state = ConnectionState::Writing(writer, keep_alive);
                }

                ConnectionState::Writing(writer, keep_alive) => {
                    writer.write_to_stream(&mut self.stream).await?;

                    if *keep_alive {
                        self.state = ConnectionState::Reading; // go back for next request
                    } else {
                        self.state = ConnectionState::Closed;
                    }
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    async fn read_request(&mut self) -> Result<Option<Request>, ReadError> {
        loop {
            // Try parsing whatever we already have
            match parse_http_request(&self.buffer) {
                Ok((request, consumed)) => {
                    let _ = self.buffer.split_to(consumed);
                    return Ok(Some(request));
                }

                Err(ParseError::Incomplete) => {}

                Err(e) => return Err(ReadError::Malformed(e)),
            }

            self.buffer.reserve(READ_CHUNK);
            let n = self.stream.read_buf(&mut self.buffer).await.map_err(ReadError::Io)?;

            if n == 0 {
                if self.buffer.is_empty() {
                    // Client closed between requests
                    return Ok(None);
                }
                return Err(ReadError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed mid-request",
                )));
            }
        }
    }
}

enum ReadError {
    Malformed(ParseError),
    Io(std::io::Error),
}
