use may::coroutine::JoinHandle;
use may_minihttp::{HttpServerWithHeaders, HttpService};
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Wrapper around may_minihttp's HTTP server
///
/// Uses 32 max headers to handle API gateway/proxy traffic.
pub struct HttpServer<T>(pub T);

/// Handle to a running HTTP server
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the listener was bound to.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Poll the listener until it accepts a TCP connection.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` if the server doesn't become ready within ~250ms.
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Cancel the accept loop and wait for it to finish.
    #[allow(unsafe_code)]
    pub fn stop(self) {
        // SAFETY: cancel() is unsafe because it unwinds the target coroutine.
        // We own the handle and join it immediately after.
        unsafe {
            self.handle.coroutine().cancel();
        }
        // A cancelled coroutine reports its unwind as a join error.
        if self.handle.join().is_err() {
            debug!(addr = %self.addr, "Server coroutine cancelled");
        }
        info!(addr = %self.addr, "Server stopped");
    }

    /// Block until the server coroutine finishes.
    ///
    /// # Errors
    ///
    /// Returns an error if the server coroutine panicked.
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    /// Start the HTTP server on the given address
    ///
    /// Port 0 is resolved to a free ephemeral port first, so the returned
    /// handle always reports the port actually served.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or the port cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        let addr = concrete_addr(addr)?;
        let handle = HttpServerWithHeaders::<_, 32>(self.0).start(addr)?;
        info!(%addr, "Server listening");
        Ok(ServerHandle { addr, handle })
    }
}

/// Replace port 0 with the ephemeral port the OS hands out for `addr`.
fn concrete_addr(addr: SocketAddr) -> io::Result<SocketAddr> {
    if addr.port() != 0 {
        return Ok(addr);
    }
    // may_minihttp binds internally; this listener only reserves the port number.
    let listener = TcpListener::bind(addr)?;
    listener.local_addr()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concrete_addr_keeps_explicit_port() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        assert_eq!(concrete_addr(addr).unwrap(), addr);
    }

    #[test]
    fn test_concrete_addr_assigns_port_zero() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let resolved = concrete_addr(addr).unwrap();
        assert_eq!(resolved.ip(), addr.ip());
        assert_ne!(resolved.port(), 0);
    }
}
