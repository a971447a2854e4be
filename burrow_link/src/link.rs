use std::io::ErrorKind;
use std::net::SocketAddr;

use serde_json::{error::Category, Deserializer};
use thiserror::Error;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream, ToSocketAddrs},
    select,
    sync::mpsc::{channel, Receiver, Sender},
};
use tracing::{debug, error, warn};

use crate::message::{Introduction, Message, Protocol};

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("connection closed")]
    Closed,
    #[error("unexpected frame during handshake")]
    Handshake,
    #[error("connection denied: {0}")]
    Denied(String),
}

/// One established connection, after the introduction handshake has
/// completed. Messages are relayed by a background task; `send` works from
/// a shared reference (see [`LinkHandle`]), `recv` needs the single owner.
pub struct Link {
    out_tx: Sender<Message>,
    in_rx: Receiver<Message>,
}

impl Link {
    /// Open a connection to a base and introduce ourselves. Resolves once
    /// the base has accepted the introduction.
    pub async fn connect<A: ToSocketAddrs>(
        addr: A,
        introduction: Introduction,
    ) -> Result<Self, LinkError> {
        let mut stream = TcpStream::connect(addr).await?;
        write_frame(&mut stream, &Protocol::Introduction(introduction)).await?;

        let mut buffer = Vec::new();
        match read_frame(&mut stream, &mut buffer).await {
            Some(Protocol::Accepted) => {}
            Some(Protocol::Denied(reason)) => return Err(LinkError::Denied(reason)),
            Some(_) => return Err(LinkError::Handshake),
            None => return Err(LinkError::Closed),
        }
        Ok(Self::start_relay(stream, buffer))
    }

    fn start_relay(mut stream: TcpStream, mut buffer: Vec<u8>) -> Self {
        let (out_tx, mut out_rx) = channel::<Message>(50);
        let (in_tx, in_rx) = channel(50);

        tokio::spawn(async move {
            loop {
                select! {
                    frame = read_frame(&mut stream, &mut buffer) => {
                        match frame {
                            Some(Protocol::Message(message)) => {
                                if in_tx.send(message).await.is_err() {
                                    // receiving side is gone, drop the connection
                                    break;
                                }
                            }
                            Some(_) => {
                                warn!("peer sent a handshake frame on an established link");
                            }
                            None => {
                                // connection has closed
                                break;
                            }
                        }
                    },
                    msg = out_rx.recv() => {
                        match msg {
                            Some(msg) => {
                                if let Err(e) = write_frame(&mut stream, &Protocol::Message(msg)).await {
                                    error!("failed to write to connection: {}", e);
                                    break;
                                }
                            }
                            None => {
                                // every sender has been dropped
                                break;
                            }
                        }
                    }
                }
            }
        });

        Self { out_tx, in_rx }
    }

    /// Send a message over this link.
    pub async fn send(&self, msg: Message) -> Result<(), LinkError> {
        self.out_tx.send(msg).await.map_err(|_| LinkError::Closed)
    }

    /// Receive the next message, waiting if there is none. Returns None
    /// once the connection has closed and the buffer has drained.
    pub async fn recv(&mut self) -> Option<Message> {
        self.in_rx.recv().await
    }

    /// A clonable sending handle onto this link.
    pub fn handle(&self) -> LinkHandle {
        LinkHandle {
            out_tx: self.out_tx.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LinkHandle {
    out_tx: Sender<Message>,
}

impl LinkHandle {
    pub async fn send(&self, msg: Message) -> Result<(), LinkError> {
        self.out_tx.send(msg).await.map_err(|_| LinkError::Closed)
    }
}

/// Accepts incoming connections and reads their introductions. The owner
/// decides per connection whether to `accept` or `deny` it.
pub struct LinkListener {
    listener: TcpListener,
}

impl LinkListener {
    pub async fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self, LinkError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, LinkError> {
        Ok(self.listener.local_addr()?)
    }

    /// Wait for the next connection that completes an introduction.
    /// Connections that close or talk nonsense before introducing
    /// themselves are skipped.
    pub async fn accept(&mut self) -> Result<PendingLink, LinkError> {
        loop {
            let (stream, addr) = self.listener.accept().await?;
            match PendingLink::answer(stream).await {
                Ok(pending) => return Ok(pending),
                Err(e) => {
                    debug!("handshake with {} failed: {}", addr, e);
                }
            }
        }
    }
}

/// A connection that has introduced itself but has not been answered yet.
pub struct PendingLink {
    stream: TcpStream,
    buffer: Vec<u8>,
    introduction: Introduction,
}

impl PendingLink {
    async fn answer(mut stream: TcpStream) -> Result<Self, LinkError> {
        let mut buffer = Vec::new();
        match read_frame(&mut stream, &mut buffer).await {
            Some(Protocol::Introduction(introduction)) => Ok(Self {
                stream,
                buffer,
                introduction,
            }),
            Some(_) => Err(LinkError::Handshake),
            None => Err(LinkError::Closed),
        }
    }

    pub fn introduction(&self) -> &Introduction {
        &self.introduction
    }

    /// Accept the connection and start relaying messages.
    pub async fn accept(mut self) -> Result<Link, LinkError> {
        write_frame(&mut self.stream, &Protocol::Accepted).await?;
        Ok(Link::start_relay(self.stream, self.buffer))
    }

    /// Refuse the connection, telling the peer why, and drop it.
    pub async fn deny<M: Into<String>>(mut self, reason: M) {
        let reason = reason.into();
        if let Err(e) = write_frame(&mut self.stream, &Protocol::Denied(reason)).await {
            debug!("failed to send denial: {}", e);
        }
    }
}

async fn write_frame(stream: &mut TcpStream, frame: &Protocol) -> Result<(), LinkError> {
    let raw_data = serde_json::to_string(frame)?;
    stream.write_all(raw_data.as_bytes()).await?;
    Ok(())
}

async fn read_frame(stream: &mut TcpStream, buffer: &mut Vec<u8>) -> Option<Protocol> {
    loop {
        // Attempt to deserialize one frame from the buffer
        let mut deserializer = Deserializer::from_slice(buffer.as_slice()).into_iter::<Protocol>();

        match deserializer.next() {
            Some(Ok(frame)) => {
                *buffer = buffer[deserializer.byte_offset()..].to_vec();
                break Some(frame);
            }
            Some(Err(ref e)) if e.classify() == Category::Eof => {
                // an incomplete frame, the rest may arrive later
            }
            Some(Err(e)) => {
                error!("encountered deserialization error: {}", e);
                break None;
            }
            None => {
                // nothing buffered yet
            }
        }

        // if there is insufficient data to deserialize, read some more
        let mut read_buffer = [0; 1024];
        match stream.read(&mut read_buffer).await {
            Ok(0) => {
                return None;
            }
            Ok(len) => {
                buffer.extend_from_slice(&read_buffer[..len]);
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                continue; // try to read again
            }
            Err(e) => {
                error!("encountered error reading from connection: {}", e);
                return None;
            }
        }
    }
}
