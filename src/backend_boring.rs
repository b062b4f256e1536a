//! The real back-end: BoringSSL through the `boring` crate family,
//! wired to the rest of this crate's modules.

use crate::backend::TlsBackend;
use crate::collab::{Readiness, TcpConnection};
use crate::engine::Engine;
use crate::handshake::{Connection, HandshakeOutcome};
use crate::{handshake, io, shutdown, Error};

/// A `TlsBackend` driven by BoringSSL.
#[derive(Debug, Default)]
pub struct BoringBackend;

impl TlsBackend for BoringBackend {
    fn open(
        &self,
        engine: &Engine,
        tcp: &dyn TcpConnection,
        readiness: &dyn Readiness,
    ) -> Result<(Connection, HandshakeOutcome), Error> {
        handshake::open(engine, tcp, readiness)
    }

    fn read_timeout(
        &self,
        conn: &mut Connection,
        buf: &mut [u8],
        timeout_ms: i32,
        readiness: &dyn Readiness,
    ) -> Result<usize, Error> {
        io::read_timeout(conn, buf, timeout_ms, readiness)
    }

    fn write_timeout(
        &self,
        conn: &mut Connection,
        buf: &[u8],
        timeout_ms: i32,
        readiness: &dyn Readiness,
    ) -> Result<usize, Error> {
        io::write_timeout(conn, buf, timeout_ms, readiness)
    }

    fn close(&self, conn: Connection) {
        shutdown::close(conn)
    }
}
