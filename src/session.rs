//! The session-resumption bridge: serializes/deserializes opaque session
//! blobs into/out of the host-owned session cache, keyed by host name
//! (spec.md §4.5).

use std::time::Duration;

use crate::collab::SessionCache;

/// Resumable blobs are cached with an 18-hour freshness bound.
pub const SESSION_FRESHNESS: Duration = Duration::from_secs(18 * 60 * 60);

/// The result of attempting session resumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// A cached session was found, deserialized, and installed.
    Installed,
    /// Nothing was cached for this host name.
    NotCached,
    /// A blob was cached but failed to deserialize or install.
    Corrupt,
}

#[cfg(feature = "boring-tls")]
mod imp {
    use super::*;
    use boring::ssl::{SslContext, SslRef, SslSession};

    /// Look up `hostname` in `cache`; if present, deserialize and install
    /// the session on `ssl` ahead of the handshake attempt.
    pub fn resume(
        ssl: &mut SslRef,
        ctx: &SslContext,
        cache: Option<&dyn SessionCache>,
        hostname: &str,
    ) -> ResumeOutcome {
        let cache = match cache {
            Some(c) => c,
            None => return ResumeOutcome::NotCached,
        };
        let blob = match cache.get(hostname) {
            Some(b) => b,
            None => return ResumeOutcome::NotCached,
        };
        let session = match unsafe { SslSession::from_der(&blob) } {
            Ok(s) => s,
            Err(e) => {
                log::debug!("failed to deserialize cached session for {hostname}: {e}");
                return ResumeOutcome::Corrupt;
            }
        };
        if !session.is_resumable(ctx) {
            log::debug!("cached session for {hostname} is no longer resumable");
            return ResumeOutcome::Corrupt;
        }
        match unsafe { ssl.set_session(&session) } {
            Ok(()) => ResumeOutcome::Installed,
            Err(e) => {
                log::debug!("failed to install cached session for {hostname}: {e}");
                ResumeOutcome::Corrupt
            }
        }
    }

    /// Extract the just-negotiated session from `ssl` and cache it under
    /// `hostname`. No-op if the cache handle is unset or no session is
    /// available.
    pub fn save(ssl: &SslRef, cache: Option<&dyn SessionCache>, hostname: &str) {
        let cache = match cache {
            Some(c) => c,
            None => return,
        };
        let session = match ssl.session() {
            Some(s) => s,
            None => return,
        };
        let der = session.to_der().unwrap_or_default();
        if der.is_empty() {
            return;
        }
        cache.add(hostname, der, SESSION_FRESHNESS);
    }
}

#[cfg(feature = "boring-tls")]
pub use imp::{resume, save};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeCache {
        store: Mutex<std::collections::HashMap<String, Vec<u8>>>,
    }

    impl SessionCache for FakeCache {
        fn get(&self, hostname: &str) -> Option<Vec<u8>> {
            self.store.lock().unwrap().get(hostname).cloned()
        }
        fn add(&self, hostname: &str, blob: Vec<u8>, _ttl: Duration) {
            self.store.lock().unwrap().insert(hostname.to_string(), blob);
        }
    }

    #[test]
    fn freshness_bound_is_eighteen_hours() {
        assert_eq!(SESSION_FRESHNESS, Duration::from_secs(64_800));
    }

    #[test]
    fn cache_roundtrips_opaque_bytes() {
        let cache = FakeCache {
            store: Mutex::new(std::collections::HashMap::new()),
        };
        cache.add("example.com", vec![1, 2, 3], SESSION_FRESHNESS);
        assert_eq!(cache.get("example.com"), Some(vec![1, 2, 3]));
        assert_eq!(cache.get("other.example"), None);
    }
}
