//! The engine configuration store (spec.md §3/§4.1, not that we call it
//! that anywhere in code): a process-wide parameter block initialized
//! from defaults and mutated only through the three setter operations.
//! Read-only once the engine has completed initialization — later setter
//! calls are accepted but only take effect on the next init cycle.

use std::sync::Arc;

use crate::collab::{HpkpCache, OcspResponseCache, SessionCache};

/// Recognized string-valued configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKey {
    SecureProtocol,
    CaDirectory,
    CaFile,
    CertFile,
    KeyFile,
    CrlFile,
    OcspServer,
    Alpn,
}

/// Recognized integer-valued configuration keys. The three `*_TYPE` keys
/// take a [`TypeValue`] encoded as 0 (PEM) or 1 (DER); the rest are plain
/// booleans encoded as 0/1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegerKey {
    CheckCertificate,
    CheckHostname,
    PrintInfo,
    CaType,
    CertType,
    KeyType,
    Ocsp,
    OcspStapling,
}

/// PEM or DER, the domain of the `*_TYPE` integer keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeValue {
    Pem = 0,
    Der = 1,
}

impl TypeValue {
    fn from_i64(v: i64) -> TypeValue {
        if v == TypeValue::Der as i64 {
            TypeValue::Der
        } else {
            TypeValue::Pem
        }
    }
}

/// Recognized opaque-handle configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpaqueKey {
    OcspCache,
    SessionCache,
    HpkpCache,
}

/// A borrowed, non-owning handle to one of the three caches. The engine
/// never owns a cache; the host program does.
#[derive(Clone)]
pub enum OpaqueHandle {
    Ocsp(Arc<dyn OcspResponseCache>),
    Session(Arc<dyn SessionCache>),
    Hpkp(Arc<dyn HpkpCache>),
}

impl std::fmt::Debug for OpaqueHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpaqueHandle::Ocsp(_) => f.write_str("OpaqueHandle::Ocsp(..)"),
            OpaqueHandle::Session(_) => f.write_str("OpaqueHandle::Session(..)"),
            OpaqueHandle::Hpkp(_) => f.write_str("OpaqueHandle::Hpkp(..)"),
        }
    }
}

/// The process-wide configuration block. Defaults match spec.md §3.
#[derive(Clone)]
pub struct EngineConfig {
    pub secure_protocol: String,
    pub ca_directory: String,
    pub ca_file: Option<String>,
    pub cert_file: Option<String>,
    pub key_file: Option<String>,
    pub crl_file: Option<String>,
    pub ocsp_server: Option<String>,
    pub alpn: Option<String>,
    pub ca_type: TypeValue,
    pub cert_type: TypeValue,
    pub key_type: TypeValue,
    pub check_certificate: bool,
    pub check_hostname: bool,
    pub print_info: bool,
    pub ocsp: bool,
    pub ocsp_stapling: bool,
    pub ocsp_cache: Option<Arc<dyn OcspResponseCache>>,
    pub session_cache: Option<Arc<dyn SessionCache>>,
    pub hpkp_cache: Option<Arc<dyn HpkpCache>>,
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("secure_protocol", &self.secure_protocol)
            .field("ca_directory", &self.ca_directory)
            .field("ca_file", &self.ca_file)
            .field("cert_file", &self.cert_file)
            .field("key_file", &self.key_file)
            .field("crl_file", &self.crl_file)
            .field("ocsp_server", &self.ocsp_server)
            .field("alpn", &self.alpn)
            .field("ca_type", &self.ca_type)
            .field("cert_type", &self.cert_type)
            .field("key_type", &self.key_type)
            .field("check_certificate", &self.check_certificate)
            .field("check_hostname", &self.check_hostname)
            .field("print_info", &self.print_info)
            .field("ocsp", &self.ocsp)
            .field("ocsp_stapling", &self.ocsp_stapling)
            .field("ocsp_cache", &self.ocsp_cache.is_some())
            .field("session_cache", &self.session_cache.is_some())
            .field("hpkp_cache", &self.hpkp_cache.is_some())
            .finish()
    }
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            secure_protocol: "AUTO".to_string(),
            ca_directory: "system".to_string(),
            ca_file: None,
            cert_file: None,
            key_file: None,
            crl_file: None,
            ocsp_server: None,
            alpn: None,
            ca_type: TypeValue::Pem,
            cert_type: TypeValue::Pem,
            key_type: TypeValue::Pem,
            check_certificate: true,
            check_hostname: true,
            print_info: false,
            ocsp: cfg!(feature = "boring-tls"),
            ocsp_stapling: cfg!(feature = "boring-tls"),
            ocsp_cache: None,
            session_cache: None,
            hpkp_cache: None,
        }
    }
}

impl EngineConfig {
    /// Construct a configuration block with spec-mandated defaults.
    pub fn new() -> EngineConfig {
        EngineConfig::default()
    }

    /// Set a string-valued key. Setters perform no validation of the value
    /// domain — a nonsense priority string is only diagnosed at init time.
    pub fn set_string(&mut self, key: StringKey, value: impl Into<String>) {
        let value = value.into();
        match key {
            StringKey::SecureProtocol => self.secure_protocol = value,
            StringKey::CaDirectory => self.ca_directory = value,
            StringKey::CaFile => self.ca_file = Some(value),
            StringKey::CertFile => self.cert_file = Some(value),
            StringKey::KeyFile => self.key_file = Some(value),
            StringKey::CrlFile => self.crl_file = Some(value),
            StringKey::OcspServer => self.ocsp_server = Some(value),
            StringKey::Alpn => self.alpn = Some(value),
        }
    }

    /// Set an integer-valued key.
    pub fn set_integer(&mut self, key: IntegerKey, value: i64) {
        match key {
            IntegerKey::CheckCertificate => self.check_certificate = value != 0,
            IntegerKey::CheckHostname => self.check_hostname = value != 0,
            IntegerKey::PrintInfo => self.print_info = value != 0,
            IntegerKey::CaType => self.ca_type = TypeValue::from_i64(value),
            IntegerKey::CertType => self.cert_type = TypeValue::from_i64(value),
            IntegerKey::KeyType => self.key_type = TypeValue::from_i64(value),
            IntegerKey::Ocsp => self.ocsp = value != 0,
            IntegerKey::OcspStapling => self.ocsp_stapling = value != 0,
        }
    }

    /// Install an opaque cache handle. The engine holds a weak,
    /// non-owning reference to whatever the host program owns.
    pub fn set_opaque(&mut self, handle: OpaqueHandle) {
        match handle {
            OpaqueHandle::Ocsp(cache) => self.ocsp_cache = Some(cache),
            OpaqueHandle::Session(cache) => self.session_cache = Some(cache),
            OpaqueHandle::Hpkp(cache) => self.hpkp_cache = Some(cache),
        }
    }

    /// Set a string key by its recognized name, logging (not failing) on
    /// an unrecognized key. There is no getter — callers that need to
    /// observe a value must remember what they set.
    pub fn set_string_by_name(&mut self, name: &str, value: impl Into<String>) {
        let key = match name {
            "SECURE_PROTOCOL" => StringKey::SecureProtocol,
            "CA_DIRECTORY" => StringKey::CaDirectory,
            "CA_FILE" => StringKey::CaFile,
            "CERT_FILE" => StringKey::CertFile,
            "KEY_FILE" => StringKey::KeyFile,
            "CRL_FILE" => StringKey::CrlFile,
            "OCSP_SERVER" => StringKey::OcspServer,
            "ALPN" => StringKey::Alpn,
            other => {
                log::error!("unrecognized string configuration key: {other}");
                return;
            }
        };
        self.set_string(key, value);
    }

    /// Set an integer key by its recognized name, logging (not failing) on
    /// an unrecognized key.
    pub fn set_integer_by_name(&mut self, name: &str, value: i64) {
        let key = match name {
            "CHECK_CERTIFICATE" => IntegerKey::CheckCertificate,
            "CHECK_HOSTNAME" => IntegerKey::CheckHostname,
            "PRINT_INFO" => IntegerKey::PrintInfo,
            "CA_TYPE" => IntegerKey::CaType,
            "CERT_TYPE" => IntegerKey::CertType,
            "KEY_TYPE" => IntegerKey::KeyType,
            "OCSP" => IntegerKey::Ocsp,
            "OCSP_STAPLING" => IntegerKey::OcspStapling,
            other => {
                log::error!("unrecognized integer configuration key: {other}");
                return;
            }
        };
        self.set_integer(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = EngineConfig::new();
        assert_eq!(cfg.secure_protocol, "AUTO");
        assert_eq!(cfg.ca_directory, "system");
        assert!(cfg.check_certificate);
        assert!(cfg.check_hostname);
        assert!(!cfg.print_info);
    }

    #[test]
    fn unrecognized_key_is_noop() {
        let mut cfg = EngineConfig::new();
        let before = cfg.ca_directory.clone();
        cfg.set_string_by_name("NOT_A_KEY", "whatever");
        assert_eq!(cfg.ca_directory, before);
    }

    #[test]
    fn type_value_defaults_to_pem() {
        let mut cfg = EngineConfig::new();
        cfg.set_integer(IntegerKey::CaType, 99);
        assert_eq!(cfg.ca_type, TypeValue::Pem);
        cfg.set_integer(IntegerKey::CaType, 1);
        assert_eq!(cfg.ca_type, TypeValue::Der);
    }
}
