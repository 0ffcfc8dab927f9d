//! Transport primitives for reaching forwarding destinations.
//!
//! A [`Transport`] dials an address and yields a [`Connection`]; the
//! [`TransportRegistry`] maps transport kinds to implementations so the set
//! of reachable transports is explicit per forwarder rather than global
//! process state. Built-in kinds: `udp` (the forwarder default), `tcp` and
//! `tls`.

use std::{
    collections::HashMap,
    fmt,
    io::{self, Write},
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket},
    sync::Arc,
    time::Duration,
};

use native_tls::{TlsConnector, TlsStream};

use crate::options::OptionsMap;

/// Default timeout for establishing stream connections.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// An established connection to a forwarding destination.
pub trait Connection: Send {
    /// Transmit one serialised envelope: stream transports write the whole
    /// buffer, datagram transports emit a single datagram.
    fn send(&mut self, payload: &[u8]) -> io::Result<()>;
}

/// Strategy for dialling a destination address.
pub trait Transport: Send + Sync {
    /// Establish a fresh connection to `address`. `options` carries
    /// transport-specific settings from the route.
    fn dial(&self, address: &str, options: &OptionsMap) -> io::Result<Box<dyn Connection>>;
}

/// Lookup table mapping transport kinds to implementations.
///
/// Built by the host and shared with each forwarder at construction; a
/// forwarder consults it again on every reconnect.
#[derive(Clone, Default)]
pub struct TransportRegistry {
    transports: HashMap<String, Arc<dyn Transport>>,
}

impl TransportRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in transports registered under
    /// `udp`, `tcp` and `tls`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("udp", Arc::new(UdpTransport));
        registry.register("tcp", Arc::new(TcpTransport::default()));
        registry.register("tls", Arc::new(TlsTransport::default()));
        registry
    }

    /// Register `transport` under `kind`, replacing any previous entry.
    pub fn register(&mut self, kind: &str, transport: Arc<dyn Transport>) {
        self.transports.insert(kind.to_owned(), transport);
    }

    /// Look up the transport registered under `kind`.
    pub fn lookup(&self, kind: &str) -> Option<Arc<dyn Transport>> {
        self.transports.get(kind).cloned()
    }
}

impl fmt::Debug for TransportRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&str> = self.transports.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("TransportRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

/// Connectionless datagram transport; each envelope becomes one datagram.
#[derive(Clone, Copy, Debug, Default)]
pub struct UdpTransport;

impl Transport for UdpTransport {
    fn dial(&self, address: &str, _options: &OptionsMap) -> io::Result<Box<dyn Connection>> {
        let mut last_err = None;
        for addr in address.to_socket_addrs()? {
            let bind: SocketAddr = if addr.is_ipv4() {
                (Ipv4Addr::UNSPECIFIED, 0).into()
            } else {
                (Ipv6Addr::UNSPECIFIED, 0).into()
            };
            match UdpSocket::bind(bind).and_then(|socket| socket.connect(addr).map(|()| socket)) {
                Ok(socket) => return Ok(Box::new(UdpConnection { socket })),
                Err(err) => last_err = Some(err),
            }
        }
        Err(no_usable_address(last_err, address))
    }
}

struct UdpConnection {
    socket: UdpSocket,
}

impl Connection for UdpConnection {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        self.socket.send(payload).map(|_| ())
    }
}

/// Connection-oriented stream transport over plain TCP.
#[derive(Clone, Debug)]
pub struct TcpTransport {
    /// Timeout applied to each connection attempt.
    pub connect_timeout: Duration,
    /// Write timeout installed on established connections, unbounded when
    /// `None`.
    pub write_timeout: Option<Duration>,
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: None,
        }
    }
}

impl Transport for TcpTransport {
    fn dial(&self, address: &str, _options: &OptionsMap) -> io::Result<Box<dyn Connection>> {
        let stream = connect_tcp(address, self.connect_timeout)?;
        stream.set_write_timeout(self.write_timeout)?;
        Ok(Box::new(TcpConnection { stream }))
    }
}

struct TcpConnection {
    stream: TcpStream,
}

impl Connection for TcpConnection {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        self.stream.write_all(payload)?;
        self.stream.flush()
    }
}

/// TLS-wrapped stream transport.
///
/// Honours two route options: `tls.domain` overrides the name presented for
/// SNI and certificate verification (default: the host portion of the
/// address), and `tls.skip-verify` set to `"true"` disables certificate
/// validation (intended for tests).
#[derive(Clone, Debug)]
pub struct TlsTransport {
    /// Timeout applied to each connection attempt and to the handshake.
    pub connect_timeout: Duration,
    /// Write timeout installed on established connections, unbounded when
    /// `None`.
    pub write_timeout: Option<Duration>,
}

impl Default for TlsTransport {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: None,
        }
    }
}

impl Transport for TlsTransport {
    fn dial(&self, address: &str, options: &OptionsMap) -> io::Result<Box<dyn Connection>> {
        let stream = connect_tcp(address, self.connect_timeout)?;
        // Bound the handshake so a stalled peer cannot wedge dialling.
        stream.set_read_timeout(Some(self.connect_timeout))?;
        stream.set_write_timeout(Some(self.connect_timeout))?;
        let domain = options
            .get("tls.domain")
            .map(String::as_str)
            .unwrap_or_else(|| host_of(address));
        let connector = tls_connector(options)?;
        let stream = connector.connect(domain, stream).map_err(io::Error::other)?;
        let tcp_ref = stream.get_ref();
        tcp_ref.set_read_timeout(None)?;
        tcp_ref.set_write_timeout(self.write_timeout)?;
        Ok(Box::new(TlsConnection {
            stream: Box::new(stream),
        }))
    }
}

fn tls_connector(options: &OptionsMap) -> io::Result<TlsConnector> {
    let mut builder = TlsConnector::builder();
    if options.get("tls.skip-verify").is_some_and(|value| value == "true") {
        builder.danger_accept_invalid_certs(true);
        builder.danger_accept_invalid_hostnames(true);
    }
    builder.build().map_err(io::Error::other)
}

struct TlsConnection {
    stream: Box<TlsStream<TcpStream>>,
}

impl Connection for TlsConnection {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        self.stream.write_all(payload)?;
        self.stream.flush()
    }
}

fn connect_tcp(address: &str, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in address.to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream.set_nonblocking(false)?;
                return Ok(stream);
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(no_usable_address(last_err, address))
}

fn no_usable_address(last_err: Option<io::Error>, address: &str) -> io::Error {
    last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no usable address for {address}"),
        )
    })
}

/// Host portion of a `host:port` address, brackets stripped from IPv6
/// literals. The whole input is returned when no port separator is present.
fn host_of(address: &str) -> &str {
    let host = address
        .rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or(address);
    host.strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .unwrap_or(host)
}
