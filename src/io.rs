//! Framed I/O (spec.md §4.8): read/write with readiness polling and
//! want-read/want-write retry.

use crate::collab::{Directions, Readiness};
use crate::handshake::Connection;
use crate::Error;

/// Which direction a transfer call is driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// Clamp a caller-supplied timeout so values below -1 become -1 (meaning
/// "block indefinitely").
fn clamp_timeout(timeout_ms: i32) -> i32 {
    if timeout_ms < -1 {
        -1
    } else {
        timeout_ms
    }
}

#[cfg(feature = "boring-tls")]
mod imp {
    use super::*;
    use std::io::{Read, Write};

    /// `transfer(direction, session, timeout_ms, buffer)` per spec.md
    /// §4.8. Returns the byte count transferred, or a `HANDSHAKE`-kind
    /// error for the caller to re-map.
    pub fn transfer(
        direction: Direction,
        conn: &mut Connection,
        timeout_ms: i32,
        buffer: &mut [u8],
        readiness: &dyn Readiness,
    ) -> Result<usize, Error> {
        if buffer.is_empty() {
            return Ok(0);
        }
        let count = buffer.len().min(i32::MAX as usize);
        let buffer = &mut buffer[..count];
        let timeout_ms = clamp_timeout(timeout_ms);
        let fd = conn.stream.get_ref().fd;

        let mut directions = match direction {
            Direction::Read => Directions::READABLE,
            Direction::Write => Directions::WRITABLE,
        };

        loop {
            if timeout_ms != 0 {
                let ready = readiness.wait(fd, timeout_ms, directions)?;
                if ready == 0 {
                    return Err(Error::timeout());
                }
            }

            let result = match direction {
                Direction::Read => conn.stream.read(buffer),
                Direction::Write => conn.stream.write(buffer),
            };

            match result {
                Ok(n) => return Ok(n),
                Err(io_err) => {
                    if is_want_read_write(&io_err) {
                        if timeout_ms == 0 {
                            return Ok(0);
                        }
                        directions = Directions::READABLE | Directions::WRITABLE;
                        continue;
                    }
                    return Err(Error::handshake(io_err));
                }
            }
        }
    }

    fn is_want_read_write(err: &std::io::Error) -> bool {
        err.kind() == std::io::ErrorKind::WouldBlock
    }
}

#[cfg(feature = "boring-tls")]
pub use imp::transfer;

/// `read_timeout(session, buf, timeout_ms)`: re-maps `HANDSHAKE` to
/// `UNKNOWN` for the public boundary and logs the back-end error reason.
#[cfg(feature = "boring-tls")]
pub fn read_timeout(
    conn: &mut Connection,
    buf: &mut [u8],
    timeout_ms: i32,
    readiness: &dyn Readiness,
) -> Result<usize, Error> {
    transfer(Direction::Read, conn, timeout_ms, buf, readiness).map_err(remap_handshake)
}

/// `write_timeout(session, buf, timeout_ms)`.
#[cfg(feature = "boring-tls")]
pub fn write_timeout(
    conn: &mut Connection,
    buf: &[u8],
    timeout_ms: i32,
    readiness: &dyn Readiness,
) -> Result<usize, Error> {
    let mut buf = buf.to_vec();
    transfer(Direction::Write, conn, timeout_ms, &mut buf, readiness).map_err(remap_handshake)
}

#[cfg(feature = "boring-tls")]
fn remap_handshake(err: Error) -> Error {
    if err.is_handshake() {
        log::error!("transfer failed: {err}");
        Error::transport(err.to_string())
    } else {
        err
    }
}

#[cfg(not(feature = "boring-tls"))]
pub fn read_timeout(
    _conn: &mut Connection,
    _buf: &mut [u8],
    _timeout_ms: i32,
    _readiness: &dyn Readiness,
) -> Result<usize, Error> {
    Err(Error::tls_disabled())
}

#[cfg(not(feature = "boring-tls"))]
pub fn write_timeout(
    _conn: &mut Connection,
    _buf: &[u8],
    _timeout_ms: i32,
    _readiness: &dyn Readiness,
) -> Result<usize, Error> {
    Err(Error::tls_disabled())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_timeout_floors_at_negative_one() {
        assert_eq!(clamp_timeout(-5), -1);
        assert_eq!(clamp_timeout(-1), -1);
        assert_eq!(clamp_timeout(0), 0);
        assert_eq!(clamp_timeout(200), 200);
    }
}
