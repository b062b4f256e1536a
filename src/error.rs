use std::error::Error as StdError;
use std::fmt;

/// A boxed, type-erased source error.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// An error produced by the engine.
pub struct Error {
    inner: Box<Inner>,
}

struct Inner {
    kind: Kind,
    source: Option<BoxError>,
    hostname: Option<String>,
}

/// The sentinel taxonomy callers switch on. `Transport` is surfaced to the
/// public boundary as `UNKNOWN`; it is kept distinct internally so logging
/// can still name the original reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Caller-supplied invariants violated (null connection, negative
    /// socket, unknown priority string). Returned immediately, no side
    /// effects.
    Invalid,
    /// A readiness wait exceeded its bound.
    Timeout,
    /// Chain validation, host-name match, CRL, OCSP, or HPKP failed.
    Certificate,
    /// Any other handshake-level failure.
    Handshake,
    /// A fatal read/write error from the back-end. Surfaced as `UNKNOWN`.
    Transport,
    /// The crate was built without a real TLS back-end.
    TlsDisabled,
}

impl Error {
    fn new(kind: Kind, source: Option<BoxError>) -> Error {
        Error {
            inner: Box::new(Inner {
                kind,
                source,
                hostname: None,
            }),
        }
    }

    pub(crate) fn invalid<E: Into<BoxError>>(source: E) -> Error {
        Error::new(Kind::Invalid, Some(source.into()))
    }

    pub(crate) fn invalid_msg(msg: impl Into<String>) -> Error {
        Error::new(Kind::Invalid, Some(msg.into().into()))
    }

    pub(crate) fn timeout() -> Error {
        Error::new(Kind::Timeout, None)
    }

    pub(crate) fn certificate<E: Into<BoxError>>(source: E) -> Error {
        Error::new(Kind::Certificate, Some(source.into()))
    }

    pub(crate) fn handshake<E: Into<BoxError>>(source: E) -> Error {
        Error::new(Kind::Handshake, Some(source.into()))
    }

    pub(crate) fn transport<E: Into<BoxError>>(source: E) -> Error {
        Error::new(Kind::Transport, Some(source.into()))
    }

    pub(crate) fn tls_disabled() -> Error {
        Error::new(Kind::TlsDisabled, None)
    }

    pub(crate) fn with_hostname(mut self, hostname: impl Into<String>) -> Error {
        self.inner.hostname = Some(hostname.into());
        self
    }

    /// The sentinel kind this error maps to at the public boundary.
    pub fn kind(&self) -> Kind {
        self.inner.kind
    }

    /// True if this is an argument/invariant error (`INVALID`).
    pub fn is_invalid(&self) -> bool {
        self.inner.kind == Kind::Invalid
    }

    /// True if a readiness wait exceeded its bound (`TIMEOUT`).
    pub fn is_timeout(&self) -> bool {
        self.inner.kind == Kind::Timeout
    }

    /// True if chain/host-name/CRL/OCSP/HPKP validation failed
    /// (`CERTIFICATE`).
    pub fn is_certificate(&self) -> bool {
        self.inner.kind == Kind::Certificate
    }

    /// True if the handshake failed for a reason other than certificate
    /// validation (`HANDSHAKE`).
    pub fn is_handshake(&self) -> bool {
        self.inner.kind == Kind::Handshake
    }

    /// True if the back-end reported a fatal transport error, surfaced as
    /// `UNKNOWN` to the caller.
    pub fn is_transport(&self) -> bool {
        self.inner.kind == Kind::Transport
    }

    /// True if this crate was built without a real TLS back-end
    /// (`TLS_DISABLED`).
    pub fn is_tls_disabled(&self) -> bool {
        self.inner.kind == Kind::TlsDisabled
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("Error");
        builder.field("kind", &self.inner.kind);
        if let Some(ref hostname) = self.inner.hostname {
            builder.field("hostname", hostname);
        }
        if let Some(ref source) = self.inner.source {
            builder.field("source", source);
        }
        builder.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.kind {
            Kind::Invalid => write!(f, "invalid argument")?,
            Kind::Timeout => write!(f, "timed out")?,
            Kind::Certificate => write!(f, "certificate verification failed")?,
            Kind::Handshake => write!(f, "tls handshake failed")?,
            Kind::Transport => write!(f, "transport error")?,
            Kind::TlsDisabled => write!(f, "tls support is disabled in this build")?,
        }
        if let Some(ref hostname) = self.inner.hostname {
            write!(f, " ({})", hostname)?;
        }
        if let Some(ref source) = self.inner.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| &**e as _)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn mem_size_of() {
        assert_eq!(size_of::<Error>(), size_of::<usize>());
    }

    #[test]
    fn test_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = Error::transport(io);
        assert!(err.source().is_some());
        assert!(err.is_transport());
    }

    #[test]
    fn is_timeout() {
        let err = Error::timeout();
        assert!(err.is_timeout());
        assert!(!err.is_certificate());
    }

    #[test]
    fn with_hostname_shows_in_display() {
        let err = Error::certificate("bad chain").with_hostname("example.com");
        let shown = format!("{err}");
        assert!(shown.contains("example.com"));
    }
}
