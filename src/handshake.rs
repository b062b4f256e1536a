//! The handshake driver (spec.md §4.7): binds a socket to TLS state, sets
//! SNI/ALPN/host-name-verification flags, wires per-connection extension
//! data for the revocation callback, and runs the readiness/retry loop
//! until success, fatal error, or timeout.

pub use crate::collab::TcpConnection;
use crate::collab::{Directions, Readiness};
use crate::engine::Engine;
use crate::session;
use crate::Error;

/// The TLS state produced by a successful handshake. Owned by the caller;
/// consumed by [`crate::shutdown::close`] or dropped.
#[cfg(feature = "boring-tls")]
pub struct Connection {
    pub(crate) stream: boring::ssl::SslStream<StreamAdapter>,
    pub(crate) resumed: bool,
}

#[cfg(feature = "boring-tls")]
impl_debug!(Connection, { resumed });

#[cfg(not(feature = "boring-tls"))]
#[derive(Debug)]
pub struct Connection {
    _private: (),
}

/// Adapts a raw, caller-owned socket descriptor to `std::io::Read` +
/// `std::io::Write` without taking ownership of it — the underlying TCP
/// connection is the real owner and closes it independently (spec.md
/// §4.9).
#[cfg(feature = "boring-tls")]
pub struct StreamAdapter {
    pub(crate) fd: std::os::unix::io::RawFd,
}

#[cfg(feature = "boring-tls")]
impl_debug!(StreamAdapter, { fd });

#[cfg(feature = "boring-tls")]
impl std::io::Read for StreamAdapter {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        use std::os::unix::io::FromRawFd;
        let mut file = unsafe { std::mem::ManuallyDrop::new(std::fs::File::from_raw_fd(self.fd)) };
        std::io::Read::read(&mut *file, buf)
    }
}

#[cfg(feature = "boring-tls")]
impl std::io::Write for StreamAdapter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        use std::os::unix::io::FromRawFd;
        let mut file = unsafe { std::mem::ManuallyDrop::new(std::fs::File::from_raw_fd(self.fd)) };
        std::io::Write::write(&mut *file, buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Whether a connection that reached handshake success actually reused a
/// cached session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeOutcome {
    pub resumed: bool,
}

#[cfg(feature = "boring-tls")]
mod ex_data {
    use once_cell::sync::Lazy;

    /// The `Ssl` ex_data index carrying the per-connection host name into
    /// the revocation callback. An index, not a thread-local: scoped to
    /// the connection's `Ssl` object, which is the natural owner, per
    /// spec.md §9's own suggested redesign.
    pub static HOSTNAME_INDEX: Lazy<boring::ex_data::Index<boring::ssl::Ssl, String>> =
        Lazy::new(|| boring::ssl::Ssl::new_ex_index().expect("failed to allocate ex_data index"));
}

/// Read the host name stashed on the connection's `Ssl` ex_data slot, for
/// use inside the revocation callback (which only sees the
/// `X509StoreContextRef`, not the `Connection`).
#[cfg(feature = "boring-tls")]
pub fn hostname_from_ex_data(
    store_ctx: &boring::x509::store::X509StoreContextRef,
) -> Option<String> {
    let ssl_idx = boring::x509::store::X509StoreContextRef::ssl_idx().ok()?;
    store_ctx
        .ex_data(ssl_idx)
        .and_then(|ssl| ssl.ex_data(*ex_data::HOSTNAME_INDEX))
        .cloned()
}

#[cfg(not(feature = "boring-tls"))]
pub fn hostname_from_ex_data(_store_ctx: &()) -> Option<String> {
    None
}

/// Open a connection: §4.7 steps 1-8. `tcp` supplies the socket, host
/// name, and connect timeout; `readiness` is the `wait()` collaborator.
#[cfg(feature = "boring-tls")]
pub fn open(
    engine: &Engine,
    tcp: &dyn TcpConnection,
    readiness: &dyn Readiness,
) -> Result<(Connection, HandshakeOutcome), Error> {
    use boring::ssl::{Ssl, SslStream};

    let fd = tcp.socket_fd();
    if fd < 0 {
        return Err(Error::invalid_msg("socket descriptor must be non-negative"));
    }
    let hostname = tcp.ssl_hostname().to_string();
    if hostname.is_empty() {
        return Err(Error::invalid_msg("ssl_hostname must not be empty"));
    }

    engine.init()?;

    let check_hostname = engine
        .with_context(|_, cfg| cfg.check_hostname)
        .unwrap_or(true);
    let alpn = engine.with_context(|_, cfg| cfg.alpn.clone()).flatten();
    let session_cache = engine
        .with_context(|_, cfg| cfg.session_cache.clone())
        .flatten();

    let result = engine.with_context(|ctx, _| -> Result<_, Error> {
        let mut ssl = Ssl::new(&ctx.ssl_context).map_err(Error::handshake)?;

        ssl.set_ex_data(*ex_data::HOSTNAME_INDEX, hostname.clone());

        if check_hostname {
            ssl.param_mut()
                .set_host(&hostname)
                .map_err(Error::handshake)?;
            ssl.param_mut().set_hostflags(
                boring::x509::verify::X509CheckFlags::NO_PARTIAL_WILDCARDS,
            );
        } else {
            log::warn!("host name checking disabled for this connection");
        }

        ssl.set_hostname(&hostname).map_err(Error::handshake)?;

        if let Some(alpn) = &alpn {
            let wire = encode_alpn(alpn);
            ssl.set_alpn_protos(&wire).map_err(Error::handshake)?;
        }

        let outcome = session::resume(&mut ssl, &ctx.ssl_context, session_cache.as_deref(), &hostname);
        log::debug!("session resumption for {hostname}: {outcome:?}");

        Ok(ssl)
    });
    let mut ssl = match result {
        Some(Ok(ssl)) => ssl,
        Some(Err(e)) => return Err(e),
        None => return Err(Error::tls_disabled()),
    };

    let connect_timeout_ms = tcp
        .connect_timeout()
        .map(|d| d.as_millis() as i32)
        .unwrap_or(0);

    let stream = StreamAdapter { fd };
    let builder = boring::ssl::SslStreamBuilder::new(ssl, stream);

    enum Step {
        Initial(boring::ssl::SslStreamBuilder<StreamAdapter>),
        Mid(boring::ssl::MidHandshakeSslStream<StreamAdapter>),
    }
    let mut step = Step::Initial(builder);

    loop {
        if connect_timeout_ms != 0 {
            let ready = readiness.wait(
                fd,
                connect_timeout_ms,
                Directions::READABLE | Directions::WRITABLE,
            )?;
            if ready == 0 {
                return Err(Error::timeout());
            }
        }

        let result = match step {
            Step::Initial(builder) => builder.connect(),
            Step::Mid(mid) => mid.handshake(),
        };

        match result {
            Ok(stream) => {
                let resumed = stream.ssl().session_reused();
                session::save(stream.ssl(), session_cache.as_deref(), &hostname);
                return Ok((Connection { stream, resumed }, HandshakeOutcome { resumed }));
            }
            Err(boring::ssl::HandshakeError::WouldBlock(mid)) => {
                step = Step::Mid(mid);
            }
            Err(boring::ssl::HandshakeError::Failure(mid)) => {
                let ssl_error = mid.error().to_string();
                let verify_failed = ssl_error.contains("certificate verify failed");
                return if verify_failed {
                    Err(Error::certificate(ssl_error).with_hostname(hostname))
                } else {
                    Err(Error::handshake(ssl_error).with_hostname(hostname))
                };
            }
            Err(boring::ssl::HandshakeError::SetupFailure(e)) => {
                return Err(Error::handshake(e).with_hostname(hostname));
            }
        }
    }
}

#[cfg(feature = "boring-tls")]
fn encode_alpn(comma_separated: &str) -> Vec<u8> {
    let mut wire = Vec::new();
    for proto in comma_separated.split(',') {
        let proto = proto.trim();
        if proto.is_empty() || proto.len() > 255 {
            continue;
        }
        wire.push(proto.len() as u8);
        wire.extend_from_slice(proto.as_bytes());
    }
    wire
}

#[cfg(not(feature = "boring-tls"))]
pub fn open(
    _engine: &Engine,
    _tcp: &dyn TcpConnection,
    _readiness: &dyn Readiness,
) -> Result<(Connection, HandshakeOutcome), Error> {
    Err(Error::tls_disabled())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpn_wire_encoding() {
        #[cfg(feature = "boring-tls")]
        {
            let wire = encode_alpn("h2,http/1.1");
            assert_eq!(wire, b"\x02h2\x08http/1.1");
        }
    }

    #[test]
    fn negative_fd_is_invalid() {
        struct BadConn;
        impl TcpConnection for BadConn {
            fn socket_fd(&self) -> std::os::unix::io::RawFd {
                -1
            }
            fn ssl_hostname(&self) -> &str {
                "example.com"
            }
            fn connect_timeout(&self) -> Option<std::time::Duration> {
                None
            }
        }
        struct NoopReadiness;
        impl Readiness for NoopReadiness {
            fn wait(
                &self,
                _fd: std::os::unix::io::RawFd,
                _timeout_ms: i32,
                _directions: Directions,
            ) -> Result<i32, Error> {
                Ok(1)
            }
        }
        let engine = Engine::new(crate::config::EngineConfig::new());
        let err = open(&engine, &BadConn, &NoopReadiness).unwrap_err();
        assert!(err.is_invalid());
    }
}
