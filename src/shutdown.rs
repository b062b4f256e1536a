//! Graceful shutdown (spec.md §4.9): close repeats the back-end's
//! shutdown step while it reports "not yet finished from our side", then
//! releases the TLS state. The underlying TCP socket is left open so the
//! caller can close it independently.

use crate::handshake::Connection;

/// Close `conn`, consuming it. Calling `close` on an already-closed slot
/// is a caller-side no-op (the slot holds no `Connection` to begin with)
/// — this function simply takes ownership and drops the handle.
#[cfg(feature = "boring-tls")]
pub fn close(mut conn: Connection) {
    loop {
        match conn.stream.shutdown() {
            Ok(boring::ssl::ShutdownResult::Sent) => continue,
            Ok(boring::ssl::ShutdownResult::Received) => break,
            Err(e) => {
                log::debug!("tls shutdown did not complete cleanly: {e}");
                break;
            }
        }
    }
    // `conn` drops here: releases the `Ssl`/`SslStream` and, with them,
    // the ex_data host-name slot. The raw fd inside `StreamAdapter` is
    // never closed — the caller's TCP connection owns it.
}

#[cfg(not(feature = "boring-tls"))]
pub fn close(_conn: Connection) {}

#[cfg(test)]
mod tests {
    // `close` takes a live `Connection`, which requires a real handshake
    // to construct; exercised by the integration scenarios in `tests/`.
}
