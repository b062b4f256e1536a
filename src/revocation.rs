//! The revocation / pinning validator (spec.md §4.6): installed once on
//! the shared TLS context, invoked by the back-end once it has assembled
//! a candidate certificate chain and is about to enforce revocation.
//!
//! Computes two independent decisions and returns their logical AND: an
//! OCSP decision (walking the chain pairwise, querying a responder per
//! certificate) and an HPKP decision (checking every chain certificate's
//! SubjectPublicKeyInfo against the host's pinned keys).

use std::sync::Arc;

use crate::collab::{HpkpCache, HttpFetcher, PinResult};
use crate::config::EngineConfig;

/// Human-readable translation of an OCSP revocation reason code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationReason {
    Unspecified,
    KeyCompromise,
    CaCompromise,
    AffiliationChanged,
    Superseded,
    CessationOfOperation,
    CertificateHold,
    RemoveFromCrl,
    Unknown,
}

impl RevocationReason {
    /// Decode an OCSP `CRLReason` code into the logging taxonomy spec.md
    /// §4.6 names.
    pub fn from_code(code: i32) -> RevocationReason {
        match code {
            0 => RevocationReason::Unspecified,
            1 => RevocationReason::KeyCompromise,
            2 => RevocationReason::CaCompromise,
            3 => RevocationReason::AffiliationChanged,
            4 => RevocationReason::Superseded,
            5 => RevocationReason::CessationOfOperation,
            6 => RevocationReason::CertificateHold,
            8 => RevocationReason::RemoveFromCrl,
            _ => RevocationReason::Unknown,
        }
    }

    /// The human-readable string logged alongside a `revoked` verdict.
    pub fn as_str(self) -> &'static str {
        match self {
            RevocationReason::Unspecified => "unspecified",
            RevocationReason::KeyCompromise => "keyCompromise",
            RevocationReason::CaCompromise => "CACompromise",
            RevocationReason::AffiliationChanged => "affiliationChanged",
            RevocationReason::Superseded => "superseded",
            RevocationReason::CessationOfOperation => "cessationOfOperation",
            RevocationReason::CertificateHold => "certificateHold",
            RevocationReason::RemoveFromCrl => "removeFromCRL",
            RevocationReason::Unknown => "unknown",
        }
    }
}

/// Context the validator needs beyond the chain itself: the HTTP
/// collaborator for OCSP fetches, and the two host-state bits the
/// revocation callback can't read off the chain alone.
pub struct ValidatorContext {
    pub http: Option<Arc<dyn HttpFetcher>>,
    pub hpkp: Option<Arc<dyn HpkpCache>>,
    pub ocsp_server_fallback: Option<String>,
    pub ocsp_enabled: bool,
}

impl std::fmt::Debug for ValidatorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorContext")
            .field("http", &self.http.is_some())
            .field("hpkp", &self.hpkp.is_some())
            .field("ocsp_server_fallback", &self.ocsp_server_fallback)
            .field("ocsp_enabled", &self.ocsp_enabled)
            .finish()
    }
}

impl ValidatorContext {
    pub fn from_config(cfg: &EngineConfig, http: Option<Arc<dyn HttpFetcher>>) -> ValidatorContext {
        ValidatorContext {
            http,
            hpkp: cfg.hpkp_cache.clone(),
            ocsp_server_fallback: cfg.ocsp_server.clone(),
            ocsp_enabled: cfg.ocsp,
        }
    }
}

#[cfg(feature = "boring-tls")]
mod imp {
    use super::*;
    use boring::x509::X509;
    use openssl::hash::MessageDigest;
    use openssl::ocsp::{OcspCertId, OcspFlag, OcspRequest, OcspResponse, OcspResponseStatus};
    use openssl::x509::store::X509Store as OpensslStore;
    use openssl::x509::X509 as OpensslX509;

    const MAX_REDIRECTS: u32 = 5;

    /// Re-parse a `boring` certificate's DER into an `openssl` certificate
    /// for the span of building/verifying the OCSP PDU; `boring` has no
    /// client-side OCSP codec, `openssl`'s `ocsp` module does, and the two
    /// crates' DER is interchangeable.
    fn to_openssl(cert: &X509) -> Result<OpensslX509, ()> {
        let der = cert.to_der().map_err(|_| ())?;
        OpensslX509::from_der(&der).map_err(|_| ())
    }

    /// One non-root (certificate, issuer) pair in the chain, walked
    /// leaf-to-root. Per spec.md §4.6's open question: iterate every
    /// adjacent pair exactly once, do not advance the index twice per
    /// iteration.
    fn chain_pairs(chain: &[X509]) -> impl Iterator<Item = (&X509, &X509)> {
        chain.windows(2).map(|pair| (&pair[0], &pair[1]))
    }

    /// The OCSP decision: true (pass) only if every non-root certificate
    /// in the chain checks out.
    pub fn ocsp_decision(chain: &[X509], ctx: &ValidatorContext, store: &OpensslStore) -> bool {
        if !ctx.ocsp_enabled {
            return true;
        }
        let http = match &ctx.http {
            Some(h) => h,
            None => {
                log::error!("OCSP enabled but no HTTP collaborator configured");
                return false;
            }
        };
        for (cert, issuer) in chain_pairs(chain) {
            if !check_one(cert, issuer, http.as_ref(), ctx, store) {
                return false;
            }
        }
        true
    }

    fn check_one(
        cert: &X509,
        issuer: &X509,
        http: &dyn HttpFetcher,
        ctx: &ValidatorContext,
        store: &OpensslStore,
    ) -> bool {
        let (cert, issuer) = match (to_openssl(cert), to_openssl(issuer)) {
            (Ok(c), Ok(i)) => (c, i),
            _ => {
                log::error!("failed to re-parse certificate for OCSP");
                return false;
            }
        };

        let responder_uri = aia_ocsp_uri(&cert).or_else(|| ctx.ocsp_server_fallback.clone());
        let responder_uri = match responder_uri {
            Some(uri) => uri,
            None => {
                log::error!("certificate has no AIA OCSP responder and no fallback configured");
                return false;
            }
        };

        let cert_id = match OcspCertId::from_cert(MessageDigest::sha256(), &cert, &issuer) {
            Ok(id) => id,
            Err(e) => {
                log::error!("failed to build OCSP CertID: {e}");
                return false;
            }
        };

        let mut request = match OcspRequest::new() {
            Ok(r) => r,
            Err(e) => {
                log::error!("failed to build OCSP request: {e}");
                return false;
            }
        };
        if request.add_id(cert_id.clone()).is_err() {
            log::error!("failed to add CertID to OCSP request");
            return false;
        }
        let nonce_added = request.add_nonce().is_ok();
        if !nonce_added {
            log::debug!("failed to add nonce to OCSP request, continuing without it");
        }

        let der = match request.to_der() {
            Ok(d) => d,
            Err(e) => {
                log::error!("failed to encode OCSP request: {e}");
                return false;
            }
        };

        let (status, body) = match http.fetch(
            &responder_uri,
            "application/ocsp-request",
            &der,
            MAX_REDIRECTS,
        ) {
            Ok(r) => r,
            Err(e) => {
                log::error!("OCSP fetch to {responder_uri} failed: {e}");
                return false;
            }
        };
        if status != 200 {
            log::error!("OCSP responder {responder_uri} returned HTTP {status}");
            return false;
        }

        let response = match OcspResponse::from_der(&body) {
            Ok(r) => r,
            Err(e) => {
                log::error!("failed to decode OCSP response: {e}");
                return false;
            }
        };
        if response.status() != OcspResponseStatus::SUCCESSFUL {
            log::error!("OCSP response status was not successful");
            return false;
        }
        let basic = match response.basic() {
            Ok(b) => b,
            Err(e) => {
                log::error!("failed to decode OCSP basic response: {e}");
                return false;
            }
        };

        if nonce_added {
            match basic.check_nonce(&request) {
                openssl::ocsp::OcspNonceStatus::EQUAL => {}
                other => {
                    log::error!("OCSP nonce mismatch: {other:?}");
                    return false;
                }
            }
        }

        let mut flags = OcspFlag::empty();
        flags.insert(OcspFlag::TRUST_OTHER);
        let mut certs = openssl::stack::Stack::new().expect("new cert stack");
        let _ = certs.push(issuer.clone());
        if let Err(e) = basic.verify(&certs, store, flags) {
            log::error!("OCSP response signature did not verify: {e}");
            return false;
        }

        let (status, reason, this_update, next_update) = match basic.find_status(&cert_id) {
            Some(s) => (
                s.status,
                s.reason,
                s.this_update.to_owned(),
                s.next_update.map(|t| t.to_owned()),
            ),
            None => {
                log::error!("no status entry for this certificate in OCSP response");
                return false;
            }
        };

        let now = openssl::asn1::Asn1Time::days_from_now(0).expect("current time");
        if this_update.compare(&now).map(|o| o.is_gt()).unwrap_or(true) {
            log::error!("OCSP response thisUpdate is in the future");
            return false;
        }
        if let Some(next) = &next_update {
            if next.compare(&now).map(|o| o.is_lt()).unwrap_or(true) {
                log::error!("OCSP response nextUpdate has passed");
                return false;
            }
        }

        match status {
            openssl::ocsp::OcspCertStatus::GOOD => true,
            openssl::ocsp::OcspCertStatus::REVOKED => {
                log::error!("certificate revoked, reason: {reason:?}");
                false
            }
            _ => {
                log::error!("OCSP status for certificate is unknown");
                false
            }
        }
    }

    fn aia_ocsp_uri(cert: &OpensslX509) -> Option<String> {
        cert.ocsp_responders()
            .ok()
            .and_then(|stack| stack.iter().next().map(|s| s.to_string()))
    }

    /// The HPKP decision per spec.md §4.6: the chain passes if at least
    /// one certificate matches a pin, OR every certificate reports "no
    /// pin on file", OR every lookup errored; it fails if ANY certificate
    /// mismatches.
    pub fn hpkp_decision(chain: &[X509], hostname: &str, hpkp: Option<&dyn HpkpCache>) -> bool {
        let hpkp = match hpkp {
            Some(h) => h,
            None => return true,
        };
        let mut saw_match = false;
        let mut saw_no_pin = false;
        let mut saw_error = false;
        for cert in chain {
            let spki = match subject_public_key_info_der(cert) {
                Ok(der) => der,
                Err(_) => {
                    log::debug!("failed to compute SPKI for chain certificate");
                    saw_error = true;
                    continue;
                }
            };
            match hpkp.hpkp_check(hostname, &spki) {
                PinResult::Match => saw_match = true,
                PinResult::NoPin => saw_no_pin = true,
                PinResult::LookupError => {
                    log::debug!("HPKP lookup error for {hostname}");
                    saw_error = true;
                }
                PinResult::Mismatch => {
                    log::error!("HPKP mismatch for {hostname}: pinned key not presented");
                    return false;
                }
            }
        }
        saw_match || saw_no_pin || (saw_error && !saw_no_pin && !saw_match)
    }

    /// The DER encoding of a certificate's SubjectPublicKeyInfo — the
    /// quantity HPKP pins.
    pub fn subject_public_key_info_der(cert: &X509) -> Result<Vec<u8>, ()> {
        let pkey = cert.public_key().map_err(|_| ())?;
        pkey.public_key_to_der().map_err(|_| ())
    }
}

#[cfg(feature = "boring-tls")]
pub use imp::{hpkp_decision, ocsp_decision, subject_public_key_info_der};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revocation_reason_round_trips_known_codes() {
        assert_eq!(RevocationReason::from_code(1), RevocationReason::KeyCompromise);
        assert_eq!(RevocationReason::from_code(4), RevocationReason::Superseded);
        assert_eq!(RevocationReason::from_code(42).as_str(), "unknown");
    }
}
