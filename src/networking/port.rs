use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use log::trace;

use super::assignments::SYSTEM_PORT_LIMIT;

/// Default timeout for the connect test
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Decides whether a port is free right now
pub trait PortProbe {
    /// Check if a port is available
    fn is_available(&self, port: u16) -> bool;
}

/// Probe that asks the kernel by binding and connecting.
///
/// A port is available when it can be bound on the wildcard address and a
/// connection to it on the probe host is refused. The answer is only valid
/// at the instant of the check.
#[derive(Debug, Clone)]
pub struct SocketProbe {
    host: IpAddr,
    connect_timeout: Duration,
}

impl Default for SocketProbe {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl SocketProbe {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            connect_timeout,
        }
    }

    fn can_bind(&self, port: u16) -> bool {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
        TcpListener::bind(addr).is_ok()
    }

    fn refuses_connection(&self, port: u16) -> bool {
        let addr = SocketAddr::new(self.host, port);
        match TcpStream::connect_timeout(&addr, self.connect_timeout) {
            Ok(_) => false,
            Err(e) => e.kind() == ErrorKind::ConnectionRefused,
        }
    }
}

impl PortProbe for SocketProbe {
    fn is_available(&self, port: u16) -> bool {
        if port < SYSTEM_PORT_LIMIT {
            return false;
        }
        let free = self.can_bind(port) && self.refuses_connection(port);
        trace!("Port {} is {}", port, if free { "free" } else { "in use" });
        free
    }
}

/// Check if a port is used, using the default probe
pub fn port_is_used(port: u16) -> bool {
    !SocketProbe::default().is_available(port)
}
