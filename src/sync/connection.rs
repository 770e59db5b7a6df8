// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Transports for line-delimited JSON deltas and the task that pumps them.

use crate::errors::SyncError;
use crate::observability::messages::sync::{ConnectionClosed, ConnectionOpened, DeltaRejected};
use crate::observability::messages::StructuredLog;
use crate::sync::DeltaAdaptor;
use crate::traits::DeltaTransport;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Deltas over a TCP connection, one JSON document per line.
pub struct TcpTransport {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
    peer: String,
}

impl TcpTransport {
    pub async fn connect<A: ToSocketAddrs>(address: A) -> Result<Self, SyncError> {
        let stream = TcpStream::connect(address).await?;
        Self::from_stream(stream)
    }

    /// Wraps an accepted or connected stream.
    pub fn from_stream(stream: TcpStream) -> Result<Self, SyncError> {
        let peer = stream.peer_addr()?.to_string();
        stream.set_nodelay(true)?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            lines: BufReader::new(reader).lines(),
            writer,
            peer,
        })
    }
}

#[async_trait]
impl DeltaTransport for TcpTransport {
    async fn send(&mut self, line: &str) -> Result<(), SyncError> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<Option<String>, SyncError> {
        Ok(self.lines.next_line().await?)
    }

    fn peer(&self) -> String {
        self.peer.clone()
    }
}

/// In-memory transport; [`ChannelTransport::pair`] returns both ends.
pub struct ChannelTransport {
    sender: mpsc::UnboundedSender<String>,
    receiver: mpsc::UnboundedReceiver<String>,
    peer: String,
}

impl ChannelTransport {
    pub fn pair() -> (Self, Self) {
        let (left_tx, left_rx) = mpsc::unbounded_channel();
        let (right_tx, right_rx) = mpsc::unbounded_channel();
        (
            Self {
                sender: left_tx,
                receiver: right_rx,
                peer: "channel:right".to_string(),
            },
            Self {
                sender: right_tx,
                receiver: left_rx,
                peer: "channel:left".to_string(),
            },
        )
    }
}

#[async_trait]
impl DeltaTransport for ChannelTransport {
    async fn send(&mut self, line: &str) -> Result<(), SyncError> {
        self.sender.send(line.to_string()).map_err(|_| SyncError::Closed)
    }

    async fn receive(&mut self) -> Result<Option<String>, SyncError> {
        Ok(self.receiver.recv().await)
    }

    fn peer(&self) -> String {
        self.peer.clone()
    }
}

/// Counts of a finished synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncSummary {
    pub sent: u64,
    pub received: u64,
}

enum Event {
    Cancelled,
    Outgoing(Option<String>),
    Incoming(Result<Option<String>, SyncError>),
}

/// Pumps deltas between a universe and a peer until cancelled or either
/// side closes.
pub struct UniverseSynchronizer;

impl UniverseSynchronizer {
    pub fn spawn<T>(
        adaptor: Arc<DeltaAdaptor>,
        mut transport: T,
        token: CancellationToken,
    ) -> JoinHandle<Result<SyncSummary, SyncError>>
    where
        T: DeltaTransport + 'static,
    {
        tokio::spawn(async move {
            let universe = adaptor.universe_name().to_string();
            let peer = transport.peer();
            ConnectionOpened {
                universe: &universe,
                peer: &peer,
            }
            .log();

            let mut summary = SyncSummary::default();
            let result = loop {
                let event = tokio::select! {
                    _ = token.cancelled() => Event::Cancelled,
                    delta = adaptor.next_delta() => Event::Outgoing(delta),
                    line = transport.receive() => Event::Incoming(line),
                };

                match event {
                    Event::Cancelled | Event::Outgoing(None) | Event::Incoming(Ok(None)) => break Ok(()),
                    Event::Outgoing(Some(delta)) => {
                        if let Err(error) = transport.send(&delta).await {
                            break Err(error);
                        }
                        summary.sent += 1;
                    }
                    Event::Incoming(Ok(Some(line))) => {
                        summary.received += 1;
                        match adaptor.accept(&line).await {
                            Ok(()) => {}
                            Err(SyncError::Engine(error)) => break Err(SyncError::Engine(error)),
                            Err(error) => DeltaRejected {
                                universe: &universe,
                                reason: &error.to_string(),
                            }
                            .log(),
                        }
                    }
                    Event::Incoming(Err(error)) => break Err(error),
                }
            };

            ConnectionClosed {
                universe: &universe,
                peer: &peer,
                sent: summary.sent,
                received: summary.received,
            }
            .log();
            result.map(|()| summary)
        })
    }
}
