//! Resolves the configured CA directory (including the `"system"`
//! sentinel), enumerates certificate files, loads an optional single CA
//! file, and loads an optional CRL (spec.md §4.2).

use crate::config::EngineConfig;
use crate::Error;

/// How many CA directory entries were registered. Zero is reported by the
/// caller as an error but is not itself fatal — `init` continues so the CA
/// file and CRL still get a chance to load.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadReport {
    pub directory_loaded: usize,
}

#[cfg(feature = "boring-tls")]
mod imp {
    use super::*;
    use boring::ssl::SslFiletype;
    use boring::x509::store::X509StoreBuilder;
    use boring::x509::X509VerifyFlags;
    use openssl::x509::store::X509StoreBuilder as OpensslStoreBuilder;
    use std::fs;

    const FALLBACK_DIRECTORY: &str = "/etc/ssl/certs";

    /// Load trust material into `store` per spec.md §4.2. `shadow` mirrors
    /// every loaded CA certificate into a parallel `openssl` store, which
    /// the revocation validator needs for its OCSP signature check (boring
    /// has no client-side OCSP codec).
    pub fn load(
        store: &mut X509StoreBuilder,
        shadow: &mut OpensslStoreBuilder,
        cfg: &EngineConfig,
    ) -> Result<LoadReport, Error> {
        let mut report = LoadReport::default();

        if cfg.ca_directory == "system" {
            if store.set_default_paths().is_ok() {
                log::debug!("using back-end default verify paths");
                let _ = shadow.set_default_paths();
                return Ok(report);
            }
            log::info!(
                "back-end has no default verify paths, falling back to {FALLBACK_DIRECTORY}"
            );
            report.directory_loaded += load_directory(store, shadow, FALLBACK_DIRECTORY)?;
        } else {
            report.directory_loaded += load_directory(store, shadow, &cfg.ca_directory)?;
        }

        if report.directory_loaded == 0 {
            log::error!("no trust anchors loaded from CA directory");
        }

        if let Some(ca_file) = &cfg.ca_file {
            if let Err(e) = load_ca_file(store, shadow, ca_file) {
                log::error!("failed to load ca_file {ca_file}: {e}");
            }
        }

        if let Some(crl_file) = &cfg.crl_file {
            load_crl(store, crl_file).map_err(Error::invalid)?;
        }

        Ok(report)
    }

    fn load_directory(
        store: &mut X509StoreBuilder,
        shadow: &mut OpensslStoreBuilder,
        dir: &str,
    ) -> Result<usize, Error> {
        let entries = fs::read_dir(dir).map_err(Error::invalid)?;
        let mut loaded = 0usize;
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !ends_with_pem(&name) {
                continue;
            }
            let path = std::path::Path::new(dir).join(entry.file_name());
            match fs::read(&path).ok().and_then(|bytes| {
                let cert = boring::x509::X509::from_pem(&bytes).ok()?;
                let der = cert.to_der().ok()?;
                Some((cert, der))
            }) {
                Some((cert, der)) => {
                    let added = store.add_cert(cert).is_ok();
                    if added {
                        loaded += 1;
                    }
                    if let Ok(openssl_cert) = openssl::x509::X509::from_der(&der) {
                        let _ = shadow.add_cert(openssl_cert);
                    }
                }
                None => log::debug!("skipping unreadable CA entry {}", path.display()),
            }
        }
        Ok(loaded)
    }

    /// Case-insensitive suffix test on the final four bytes, per spec.
    fn ends_with_pem(name: &str) -> bool {
        if name.len() < 4 {
            return false;
        }
        name[name.len() - 4..].eq_ignore_ascii_case(".pem")
    }

    fn load_ca_file(
        store: &mut X509StoreBuilder,
        shadow: &mut OpensslStoreBuilder,
        path: &str,
    ) -> Result<(), Error> {
        let bytes = fs::read(path).map_err(Error::invalid)?;
        let cert = boring::x509::X509::from_pem(&bytes).map_err(Error::invalid)?;
        let der = cert.to_der().map_err(Error::invalid)?;
        store.add_cert(cert).map_err(Error::invalid)?;
        if let Ok(openssl_cert) = openssl::x509::X509::from_der(&der) {
            let _ = shadow.add_cert(openssl_cert);
        }
        Ok(())
    }

    fn load_crl(store: &mut X509StoreBuilder, path: &str) -> Result<(), Error> {
        let bytes = fs::read(path).map_err(Error::invalid)?;
        let crl =
            openssl::x509::X509Crl::from_pem(&bytes).map_err(|e| Error::invalid_msg(e.to_string()))?;
        // boring::x509::store::X509StoreBuilder has no safe add_crl; drop
        // to the raw FFI pointer the way an unsafe openssl-sys add_crl
        // caller would.
        unsafe {
            use foreign_types::ForeignType;
            let crl_ptr = crl.as_ptr();
            let store_ptr = store.as_ptr();
            if boring_sys::X509_STORE_add_crl(store_ptr as *mut _, crl_ptr as *mut _) != 1 {
                return Err(Error::invalid_msg("unknown error adding CRL"));
            }
        }
        store.set_flags(X509VerifyFlags::CRL_CHECK | X509VerifyFlags::CRL_CHECK_ALL)
            .map_err(Error::invalid)?;
        let _ = SslFiletype::PEM;
        Ok(())
    }
}

#[cfg(feature = "boring-tls")]
pub use imp::load;

#[cfg(not(feature = "boring-tls"))]
pub fn load(_store: &mut (), _shadow: &mut (), _cfg: &EngineConfig) -> Result<LoadReport, Error> {
    Err(Error::tls_disabled())
}
