//! Traits for everything this crate borrows rather than owns: the OCSP
//! HTTP fetcher, the three host-keyed caches, the TCP connection object,
//! and the readiness primitive. None of these are implemented here; the
//! host program supplies concrete types (or the fakes under `tests/` do,
//! for the test suite).

use std::time::Duration;

use crate::Error;

/// Bitmask of directions a caller wants a socket to become ready in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directions(u8);

impl Directions {
    pub const READABLE: Directions = Directions(0b01);
    pub const WRITABLE: Directions = Directions(0b10);

    /// True if `other`'s bits are a subset of `self`'s.
    pub fn contains(self, other: Directions) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Directions {
    type Output = Directions;
    fn bitor(self, rhs: Directions) -> Directions {
        Directions(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Directions {
    fn bitor_assign(&mut self, rhs: Directions) {
        self.0 |= rhs.0;
    }
}

/// "Fetch URL with headers, return response body and status, following up
/// to N redirects." Used only for OCSP requests.
pub trait HttpFetcher: Send + Sync {
    /// Submit `body` to `url` with the given content type, following up to
    /// `max_redirects` redirects. Returns the HTTP status and response
    /// body.
    fn fetch(
        &self,
        url: &str,
        content_type: &str,
        body: &[u8],
        max_redirects: u32,
    ) -> Result<(u16, Vec<u8>), Error>;
}

/// A host-keyed opaque session blob cache. Bytes are never interpreted by
/// the cache.
pub trait SessionCache: Send + Sync {
    /// Look up the cached session blob for `hostname`.
    fn get(&self, hostname: &str) -> Option<Vec<u8>>;
    /// Insert `blob` under `hostname`, expiring after `ttl`.
    fn add(&self, hostname: &str, blob: Vec<u8>, ttl: Duration);
}

/// An OCSP response cache. Same shape as [`SessionCache`]; reserved for
/// future use since the validator currently forwards to the network on
/// every call.
pub trait OcspResponseCache: Send + Sync {
    /// Look up a cached OCSP response under `key`.
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    /// Insert a fetched OCSP response under `key`, expiring after `ttl`.
    fn add(&self, key: &str, blob: Vec<u8>, ttl: Duration);
}

/// The outcome of an HPKP pin lookup for a single certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinResult {
    /// The certificate's SPKI matched a pinned value.
    Match,
    /// No pin is on file for this host.
    NoPin,
    /// The lookup itself failed (e.g. cache unavailable).
    LookupError,
    /// The certificate's SPKI did not match any pinned value.
    Mismatch,
}

/// A host-keyed record of acceptable SubjectPublicKeyInfo hashes.
pub trait HpkpCache: Send + Sync {
    /// Check whether `spki_der` is an acceptable pin for `hostname`.
    fn hpkp_check(&self, hostname: &str, spki_der: &[u8]) -> PinResult;
}

/// The TCP connection object: supplies the socket, host name, and
/// connect-timeout, and owns the `ssl_session` slot between open and
/// close.
pub trait TcpConnection: Send {
    /// The connection's non-blocking socket descriptor.
    fn socket_fd(&self) -> std::os::unix::io::RawFd;
    /// The host name used for SNI, host verification, session lookup, and
    /// HPKP lookup.
    fn ssl_hostname(&self) -> &str;
    /// The connect-time readiness bound. `None` means no bound.
    fn connect_timeout(&self) -> Option<Duration>;
}

/// `wait(fd, timeout_ms, directions) -> negative error | 0 timeout |
/// positive ready`.
pub trait Readiness: Send + Sync {
    /// Block until `fd` becomes ready in one of `directions`, or
    /// `timeout_ms` elapses. A negative `timeout_ms` blocks indefinitely.
    /// Returns `Ok(0)` on timeout, `Ok(n)` with `n > 0` on readiness.
    fn wait(
        &self,
        fd: std::os::unix::io::RawFd,
        timeout_ms: i32,
        directions: Directions,
    ) -> Result<i32, Error>;
}
