//! The disabled-TLS stub (spec.md §2 item 10 / §4.10): selected whenever
//! this crate is built without the `boring-tls` feature. Every operation
//! returns the `TLS_DISABLED` sentinel without touching the socket.

use crate::backend::TlsBackend;
use crate::collab::{Readiness, TcpConnection};
use crate::engine::Engine;
use crate::handshake::{Connection, HandshakeOutcome};
use crate::Error;

/// A `TlsBackend` with no TLS support compiled in.
#[derive(Debug, Default)]
pub struct StubBackend;

impl TlsBackend for StubBackend {
    fn open(
        &self,
        _engine: &Engine,
        _tcp: &dyn TcpConnection,
        _readiness: &dyn Readiness,
    ) -> Result<(Connection, HandshakeOutcome), Error> {
        Err(Error::tls_disabled())
    }

    fn read_timeout(
        &self,
        _conn: &mut Connection,
        _buf: &mut [u8],
        _timeout_ms: i32,
        _readiness: &dyn Readiness,
    ) -> Result<usize, Error> {
        Err(Error::tls_disabled())
    }

    fn write_timeout(
        &self,
        _conn: &mut Connection,
        _buf: &[u8],
        _timeout_ms: i32,
        _readiness: &dyn Readiness,
    ) -> Result<usize, Error> {
        Err(Error::tls_disabled())
    }

    fn close(&self, _conn: Connection) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    struct NoConn;
    impl TcpConnection for NoConn {
        fn socket_fd(&self) -> std::os::unix::io::RawFd {
            3
        }
        fn ssl_hostname(&self) -> &str {
            "example.com"
        }
        fn connect_timeout(&self) -> Option<std::time::Duration> {
            None
        }
    }
    struct NoReadiness;
    impl Readiness for NoReadiness {
        fn wait(
            &self,
            _fd: std::os::unix::io::RawFd,
            _timeout_ms: i32,
            _directions: crate::collab::Directions,
        ) -> Result<i32, Error> {
            Ok(1)
        }
    }

    #[test]
    #[cfg(not(feature = "boring-tls"))]
    fn stub_open_reports_disabled() {
        let backend = StubBackend;
        let engine = Engine::new(EngineConfig::new());
        let err = backend.open(&engine, &NoConn, &NoReadiness).unwrap_err();
        assert!(err.is_tls_disabled());
    }
}
