//! The capability interface behind the dual build matrix (spec.md §9
//! Design Notes, bullet 4): a real BoringSSL-backed implementation
//! (`boring-tls` feature) and a disabled stub, expressed as two
//! implementations of the same trait rather than as `#[cfg]`-scattered
//! call sites throughout the public API.

use crate::collab::{Readiness, TcpConnection};
use crate::engine::Engine;
use crate::handshake::{Connection, HandshakeOutcome};
use crate::Error;

/// Everything the lifecycle API (`open`/`read_timeout`/`write_timeout`)
/// needs from a TLS back-end.
pub trait TlsBackend {
    /// Drive a handshake to completion or failure (spec.md §4.7).
    fn open(
        &self,
        engine: &Engine,
        tcp: &dyn TcpConnection,
        readiness: &dyn Readiness,
    ) -> Result<(Connection, HandshakeOutcome), Error>;

    /// Read with readiness retry (spec.md §4.8).
    fn read_timeout(
        &self,
        conn: &mut Connection,
        buf: &mut [u8],
        timeout_ms: i32,
        readiness: &dyn Readiness,
    ) -> Result<usize, Error>;

    /// Write with readiness retry (spec.md §4.8).
    fn write_timeout(
        &self,
        conn: &mut Connection,
        buf: &[u8],
        timeout_ms: i32,
        readiness: &dyn Readiness,
    ) -> Result<usize, Error>;

    /// Graceful close (spec.md §4.9).
    fn close(&self, conn: Connection);
}
