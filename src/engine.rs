//! The engine lifecycle (spec.md §4.4): one-time, reference-counted
//! initialization that builds a shared TLS context, installs the
//! revocation callback, and loads trust material; symmetric teardown.

use std::sync::{Arc, Mutex};

use crate::config::EngineConfig;
use crate::priority;
use crate::Error;

/// A process-wide TLS engine: reference-counted init/deinit around a
/// shared context. Cloning an `Engine` shares the same underlying state
/// (the mutex and counter), matching the source's process-singleton
/// semantics while letting a rewrite avoid genuinely global state.
#[derive(Clone)]
pub struct Engine {
    state: Arc<Mutex<State>>,
}

struct State {
    refcount: usize,
    context: Option<SharedContext>,
    config: EngineConfig,
}

#[cfg(feature = "boring-tls")]
pub(crate) struct SharedContext {
    pub(crate) ssl_context: boring::ssl::SslContext,
    pub(crate) openssl_store: Arc<openssl::x509::store::X509Store>,
}

#[cfg(not(feature = "boring-tls"))]
pub(crate) struct SharedContext;

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("Engine")
            .field("refcount", &state.refcount)
            .field("initialized", &state.context.is_some())
            .finish()
    }
}

impl Engine {
    /// Build an uninitialized engine around `config`. Configuration is
    /// frozen once `init` completes; later setter calls are accepted but
    /// only take effect on the next init cycle (i.e. after the reference
    /// count returns to zero and `init` runs again).
    pub fn new(config: EngineConfig) -> Engine {
        Engine {
            state: Arc::new(Mutex::new(State {
                refcount: 0,
                context: None,
                config,
            })),
        }
    }

    /// Mutate the configuration this engine will use on its next init
    /// cycle. Concurrent setter calls during an in-flight handshake are
    /// undefined behavior the caller must avoid, per spec.md §5.
    pub fn configure(&self, f: impl FnOnce(&mut EngineConfig)) {
        let mut state = self.state.lock().unwrap();
        f(&mut state.config);
    }

    /// First call creates the shared context; later calls are a no-op
    /// except for the counter. Returns an error (and leaves the counter
    /// at zero) if context construction, trust loading, or priority
    /// selection fails.
    pub fn init(&self) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        if state.context.is_some() {
            state.refcount += 1;
            return Ok(());
        }
        let context = build_context(&state.config)?;
        state.context = Some(context);
        state.refcount = 1;
        Ok(())
    }

    /// Decrement the reference count on every call; when it returns to
    /// exactly zero, release the shared context. Calling beyond balance
    /// underflows — callers are required to pair `init`/`deinit`.
    pub fn deinit(&self) {
        let mut state = self.state.lock().unwrap();
        state.refcount -= 1;
        if state.refcount == 0 {
            state.context = None;
        }
    }

    /// The current reference count, for tests.
    pub fn refcount(&self) -> usize {
        self.state.lock().unwrap().refcount
    }

    pub(crate) fn with_context<T>(&self, f: impl FnOnce(&SharedContext, &EngineConfig) -> T) -> Option<T> {
        let state = self.state.lock().unwrap();
        state.context.as_ref().map(|ctx| f(ctx, &state.config))
    }
}

#[cfg(feature = "boring-tls")]
fn build_context(config: &EngineConfig) -> Result<SharedContext, Error> {
    use boring::ssl::{SslContextBuilder, SslMethod, SslVerifyMode};
    use boring::x509::store::X509StoreBuilder;

    let mut priority = priority::select(&config.secure_protocol)?;
    priority::downgrade_if_unsupported(&mut priority, true);

    let mut builder =
        SslContextBuilder::new(SslMethod::tls_client()).map_err(Error::invalid)?;
    builder
        .set_cipher_list(&priority.cipher_list)
        .map_err(Error::invalid)?;
    apply_min_version(&mut builder, priority.min_version)?;

    let mut store_builder = X509StoreBuilder::new().map_err(Error::invalid)?;
    let mut shadow_builder =
        openssl::x509::store::X509StoreBuilder::new().map_err(Error::invalid)?;
    crate::trust::load(&mut store_builder, &mut shadow_builder, config)?;

    if config.check_certificate {
        builder.set_verify(SslVerifyMode::PEER | SslVerifyMode::FAIL_IF_NO_PEER_CERT);
    } else {
        log::warn!("certificate checking disabled; installing a no-op verify mode");
        builder.set_verify(SslVerifyMode::NONE);
    }

    // A parallel openssl X509Store (populated alongside boring's by
    // crate::trust::load) for the revocation callback's OCSP signature
    // verification, which needs an openssl::x509::store::X509StoreRef
    // rather than boring's type.
    let openssl_store = Arc::new(shadow_builder.build());

    let cert_store = store_builder.build();
    builder.set_cert_store(cert_store);

    if config.check_certificate {
        let hpkp_for_cb = config.hpkp_cache.clone();
        let ctx = Arc::new(crate::revocation::ValidatorContext::from_config(config, None));
        let store_for_cb = Arc::clone(&openssl_store);
        builder.set_verify_callback(
            boring::ssl::SslVerifyMode::PEER | boring::ssl::SslVerifyMode::FAIL_IF_NO_PEER_CERT,
            move |preverify_ok, store_ctx| {
                if !preverify_ok {
                    return false;
                }
                let chain: Vec<_> = match store_ctx.chain() {
                    Some(c) => c.iter().map(|c| c.to_owned()).collect(),
                    None => return false,
                };
                let hostname =
                    crate::handshake::hostname_from_ex_data(store_ctx).unwrap_or_default();
                let ocsp_ok = crate::revocation::ocsp_decision(&chain, &ctx, &store_for_cb);
                let hpkp_ok =
                    crate::revocation::hpkp_decision(&chain, &hostname, hpkp_for_cb.as_deref());
                ocsp_ok && hpkp_ok
            },
        );
    }

    Ok(SharedContext {
        ssl_context: builder.build(),
        openssl_store,
    })
}

#[cfg(feature = "boring-tls")]
fn apply_min_version(
    builder: &mut boring::ssl::SslContextBuilder,
    min: priority::MinVersion,
) -> Result<(), Error> {
    use boring::ssl::SslVersion;
    use priority::MinVersion;
    let version = match min {
        MinVersion::Ssl3 => SslVersion::SSL3,
        MinVersion::Tls1_0 => SslVersion::TLS1,
        MinVersion::Tls1_1 => SslVersion::TLS1_1,
        MinVersion::Tls1_2 => SslVersion::TLS1_2,
        MinVersion::Tls1_3 => SslVersion::TLS1_3,
    };
    builder.set_min_proto_version(Some(version)).map_err(Error::invalid)
}

#[cfg(not(feature = "boring-tls"))]
fn build_context(_config: &EngineConfig) -> Result<SharedContext, Error> {
    Err(Error::tls_disabled())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refcount_starts_at_zero() {
        let engine = Engine::new(EngineConfig::new());
        assert_eq!(engine.refcount(), 0);
    }

    #[cfg(not(feature = "boring-tls"))]
    #[test]
    fn stub_init_reports_tls_disabled() {
        let engine = Engine::new(EngineConfig::new());
        let err = engine.init().unwrap_err();
        assert!(err.is_tls_disabled());
    }

    #[test]
    fn rejecting_priority_string_leaves_engine_uninitialized() {
        let mut cfg = EngineConfig::new();
        cfg.secure_protocol = "".to_string();
        let engine = Engine::new(cfg);
        assert!(engine.init().is_err());
        assert_eq!(engine.refcount(), 0);
    }
}
