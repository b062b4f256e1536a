//! A ready-made [`Readiness`] built on `mio`: the idiomatic synchronous
//! equivalent of an async reactor's readiness wait, for callers that don't
//! already have their own event loop to poll the connection's socket from.

use std::os::unix::io::RawFd;
use std::time::Duration;

use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Token};

use crate::collab::{Directions, Readiness};
use crate::Error;

const TOKEN: Token = Token(0);

/// Polls a single raw fd with a fresh `mio::Poll` per call. Simple rather
/// than cheap: appropriate for a library whose callers drive one
/// handshake or one read/write at a time rather than thousands of
/// concurrent sockets, which would want to own a persistent `Poll`
/// themselves and implement [`Readiness`] directly instead.
#[derive(Debug, Default)]
pub struct MioReadiness;

impl Readiness for MioReadiness {
    fn wait(&self, fd: RawFd, timeout_ms: i32, directions: Directions) -> Result<i32, Error> {
        let mut interest = None;
        if directions.contains(Directions::READABLE) {
            interest = Some(Interest::READABLE);
        }
        if directions.contains(Directions::WRITABLE) {
            interest = Some(match interest {
                Some(i) => i | Interest::WRITABLE,
                None => Interest::WRITABLE,
            });
        }
        let interest = interest.unwrap_or(Interest::READABLE);

        let mut poll = Poll::new().map_err(Error::invalid)?;
        let mut source = SourceFd(&fd);
        poll.registry()
            .register(&mut source, TOKEN, interest)
            .map_err(Error::invalid)?;

        let mut events = Events::with_capacity(4);
        let timeout = if timeout_ms < 0 {
            None
        } else {
            Some(Duration::from_millis(timeout_ms as u64))
        };
        poll.poll(&mut events, timeout).map_err(Error::invalid)?;

        let _ = poll.registry().deregister(&mut source);

        if events.iter().any(|e| e.token() == TOKEN) {
            Ok(1)
        } else {
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::os::unix::io::AsRawFd;

    #[test]
    fn readable_listener_reports_ready() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let _client = std::net::TcpStream::connect(addr).expect("connect");
        let ready = MioReadiness
            .wait(listener.as_raw_fd(), 1_000, Directions::READABLE)
            .expect("wait");
        assert_eq!(ready, 1);
    }

    #[test]
    fn idle_socket_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let ready = MioReadiness
            .wait(listener.as_raw_fd(), 50, Directions::READABLE)
            .expect("wait");
        assert_eq!(ready, 0);
    }
}
