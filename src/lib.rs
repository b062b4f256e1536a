#![deny(missing_debug_implementations)]
#![cfg_attr(test, deny(warnings))]

//! # tls-engine
//!
//! A client-side TLS engine for an HTTP/download library: it drives
//! handshakes over an already-connected, non-blocking stream socket,
//! authenticates the peer against a configurable trust store with
//! revocation and pinning checks, performs framed I/O with timeouts, and
//! persists session parameters for resumption across connections.
//!
//! - [`config`] — the process-wide setter surface (string, integer,
//!   opaque-handle keys)
//! - [`trust`] — CA directory / CA file / CRL loading
//! - [`priority`] — protocol version + cipher list selection
//! - [`engine`] — reference-counted init/deinit lifecycle
//! - [`session`] — resume/save against a host-keyed cache
//! - [`revocation`] — OCSP and HPKP validation
//! - [`handshake`] — the readiness/retry loop, SNI, ALPN, host-name checks
//! - [`io`] — read/write with want-read/want-write retry
//! - [`readiness`] — a ready-made `mio`-backed [`collab::Readiness`]
//! - [`shutdown`] — graceful close
//! - [`backend`] — the capability trait behind the real/stub build matrix
//! - [`collab`] — traits for everything this crate borrows rather than
//!   owns
//!
//! This crate never performs X.509 path validation or record framing
//! itself; both are delegated to the BoringSSL back-end via the `boring`
//! crate. It does not implement a TLS server role, does not persist OCSP
//! responses across process restarts, and assumes the caller's socket is
//! non-blocking.

#[macro_use]
mod macros;

pub mod backend;
pub mod collab;
pub mod config;
pub mod engine;
mod error;
pub mod handshake;
pub mod io;
pub mod priority;
pub mod readiness;
pub mod revocation;
pub mod session;
pub mod shutdown;
pub mod trust;

#[cfg(feature = "boring-tls")]
mod backend_boring;
#[cfg(not(feature = "boring-tls"))]
mod backend_stub;

#[cfg(feature = "boring-tls")]
pub use backend_boring::BoringBackend as DefaultBackend;
#[cfg(not(feature = "boring-tls"))]
pub use backend_stub::StubBackend as DefaultBackend;

pub use backend::TlsBackend;
pub use collab::{
    Directions, HpkpCache, HttpFetcher, OcspResponseCache, PinResult, Readiness, SessionCache,
    TcpConnection,
};
pub use config::{EngineConfig, IntegerKey, OpaqueHandle, StringKey, TypeValue};
pub use engine::Engine;
pub use error::{BoxError, Error, Kind};
pub use handshake::{Connection, HandshakeOutcome};
pub use io::{read_timeout, write_timeout};
pub use priority::Priority;
pub use readiness::MioReadiness;

/// The result type every public operation returns.
pub type Result<T> = std::result::Result<T, Error>;
