//! Translates the symbolic `secure_protocol` token (or an arbitrary
//! back-end cipher string) into a minimum/maximum protocol version plus a
//! cipher-suite list (spec.md §4.3).

use crate::Error;

/// A minimum protocol bound. The maximum is always "the back-end's
/// highest known version" and isn't represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MinVersion {
    Ssl3,
    Tls1_0,
    Tls1_1,
    Tls1_2,
    Tls1_3,
}

/// The resolved outcome of priority selection: a minimum version plus the
/// cipher list string to hand to the back-end.
#[derive(Debug, Clone)]
pub struct Priority {
    pub min_version: MinVersion,
    pub cipher_list: String,
}

const DEFAULT_CIPHERS: &str = "HIGH:!aNULL:!RC4:!MD5:!SRP:!PSK";
const PFS_CIPHERS: &str = "HIGH:!aNULL:!RC4:!MD5:!SRP:!PSK:!kRSA";

/// Resolve `token` per spec.md §4.3. Case-insensitive for the ASCII
/// symbolic tokens; anything else not matching a known token is passed to
/// the back-end verbatim as the cipher list.
pub fn select(token: &str) -> Result<Priority, Error> {
    if token.is_empty() {
        return Err(Error::invalid_msg("empty secure_protocol value"));
    }
    let upper = token.to_ascii_uppercase();
    let priority = match upper.as_str() {
        "SSL" => Priority {
            min_version: MinVersion::Ssl3,
            cipher_list: DEFAULT_CIPHERS.to_string(),
        },
        "TLSV1" => Priority {
            min_version: MinVersion::Tls1_0,
            cipher_list: DEFAULT_CIPHERS.to_string(),
        },
        "TLSV1_1" => Priority {
            min_version: MinVersion::Tls1_1,
            cipher_list: DEFAULT_CIPHERS.to_string(),
        },
        "TLSV1_2" | "AUTO" => Priority {
            min_version: MinVersion::Tls1_2,
            cipher_list: DEFAULT_CIPHERS.to_string(),
        },
        "TLSV1_3" => Priority {
            min_version: MinVersion::Tls1_3,
            cipher_list: DEFAULT_CIPHERS.to_string(),
        },
        "PFS" => Priority {
            min_version: MinVersion::Tls1_2,
            cipher_list: PFS_CIPHERS.to_string(),
        },
        _ => Priority {
            min_version: MinVersion::Tls1_2,
            cipher_list: token.to_string(),
        },
    };
    Ok(priority)
}

/// Downgrade TLS 1.3 to TLS 1.2 when the back-end lacks support, logging
/// the reason. Called by the engine lifecycle after `select`, since only
/// the back-end knows whether it supports 1.3.
pub fn downgrade_if_unsupported(priority: &mut Priority, backend_supports_tls13: bool) {
    if priority.min_version == MinVersion::Tls1_3 && !backend_supports_tls13 {
        log::info!("back-end lacks TLS 1.3 support, downgrading minimum version to TLS 1.2");
        priority.min_version = MinVersion::Tls1_2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_and_tls12_are_the_default_baseline() {
        let a = select("AUTO").unwrap();
        let b = select("TLSv1_2").unwrap();
        assert_eq!(a.min_version, MinVersion::Tls1_2);
        assert_eq!(b.min_version, MinVersion::Tls1_2);
        assert_eq!(a.cipher_list, DEFAULT_CIPHERS);
    }

    #[test]
    fn pfs_forbids_rsa_key_exchange() {
        let p = select("PFS").unwrap();
        assert!(p.cipher_list.contains("!kRSA"));
        assert_eq!(p.min_version, MinVersion::Tls1_2);
    }

    #[test]
    fn case_insensitive_tokens() {
        let p = select("ssl").unwrap();
        assert_eq!(p.min_version, MinVersion::Ssl3);
    }

    #[test]
    fn arbitrary_string_passed_verbatim() {
        let p = select("this-is-not-a-cipher-spec").unwrap();
        assert_eq!(p.cipher_list, "this-is-not-a-cipher-spec");
    }

    #[test]
    fn empty_string_is_invalid() {
        assert!(select("").unwrap_err().is_invalid());
    }

    #[test]
    fn downgrade_only_applies_to_tls13() {
        let mut p = select("TLSv1_3").unwrap();
        downgrade_if_unsupported(&mut p, false);
        assert_eq!(p.min_version, MinVersion::Tls1_2);

        let mut p2 = select("TLSv1_3").unwrap();
        downgrade_if_unsupported(&mut p2, true);
        assert_eq!(p2.min_version, MinVersion::Tls1_3);
    }
}
