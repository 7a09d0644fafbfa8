//! Validation of the replies the device shows as QR codes.

use lazy_static::lazy_static;
use regex::Regex;

use crate::constants::{ADDRESS_REPLY_PATTERN, Command, FIELD_SEPARATOR, SIGNATURE_REPLY_PATTERN};
use crate::errors::AppError;
use crate::wallet::KeyValidator;

lazy_static! {
    static ref ADDRESS_REPLY: Regex = Regex::new(ADDRESS_REPLY_PATTERN).unwrap();
    static ref SIGNATURE_REPLY: Regex = Regex::new(SIGNATURE_REPLY_PATTERN).unwrap();
}

/// Check an `address;m/44'/148'/N';G...` reply against the path that was
/// requested (`expected_path` has no `m/` prefix) and return the public key.
pub fn parse_address_reply<V>(
    raw: &str,
    expected_path: &str,
    validator: &V,
) -> Result<String, AppError>
where
    V: KeyValidator + ?Sized,
{
    if !ADDRESS_REPLY.is_match(raw) {
        return Err(AppError::MalformedPayload(raw.to_string()));
    }

    let fields: Vec<&str> = raw.split(FIELD_SEPARATOR).collect();
    let [command, bip_path, public_key] = fields.as_slice() else {
        return Err(AppError::MalformedPayload(raw.to_string()));
    };

    if *command != Command::Address.as_str() {
        return Err(AppError::UnexpectedCommand(command.to_string()));
    }

    let expected = format!("m/{expected_path}");
    if *bip_path != expected {
        return Err(AppError::PathMismatch {
            expected,
            actual: bip_path.to_string(),
        });
    }

    if !validator.is_valid_public_key(public_key) {
        return Err(AppError::InvalidKey(public_key.to_string()));
    }

    Ok(public_key.to_string())
}

/// Extract the signature from a `signature;<blob>` reply. The blob is returned
/// as shown; the transaction envelope and the network verify it.
pub fn parse_signature_reply(raw: &str) -> Result<String, AppError> {
    if !SIGNATURE_REPLY.is_match(raw) {
        return Err(AppError::MalformedPayload(raw.to_string()));
    }

    raw.split(FIELD_SEPARATOR)
        .nth(1)
        .map(str::to_string)
        .ok_or_else(|| AppError::MalformedPayload(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::StrkeyValidator;

    const PUBLIC_KEY: &str = "GADQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOZPI";

    fn reply(path: &str, key: &str) -> String {
        format!("address;m/{path};{key}")
    }

    #[test]
    fn accepts_matching_address_reply() {
        let raw = reply("44'/148'/0'", PUBLIC_KEY);
        let key = parse_address_reply(&raw, "44'/148'/0'", &StrkeyValidator).unwrap();
        assert_eq!(key, PUBLIC_KEY);
    }

    #[test]
    fn pattern_only_check_with_permissive_validator() {
        let key = "ABCDEFGHIJKLMNOPQRSTUVWXYZ234567ABCDEFGHIJKLMNOPQRSTUVWX";
        assert_eq!(key.len(), 56);
        let raw = reply("44'/148'/0'", key);
        let accept_all = |_: &str| true;
        assert_eq!(parse_address_reply(&raw, "44'/148'/0'", &accept_all).unwrap(), key);
        assert!(matches!(
            parse_address_reply(&raw, "44'/148'/1'", &accept_all),
            Err(AppError::PathMismatch { expected, actual })
                if expected == "m/44'/148'/1'" && actual == "m/44'/148'/0'"
        ));
    }

    #[test]
    fn different_path_is_a_mismatch() {
        let raw = reply("44'/148'/2'", PUBLIC_KEY);
        assert!(matches!(
            parse_address_reply(&raw, "44'/148'/0'", &StrkeyValidator),
            Err(AppError::PathMismatch { .. })
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        for raw in [
            "bogus",
            "",
            "address;m/44'/148'/0'",
            "address;m/44'/148'/x';GADQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOZPI",
            "address;m/44'/784'/0';GADQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOZPI",
            "address;m/44'/148'/0';gadqobyha4dqobyha4dqobyha4dqobyha4dqobyha4dqobyha4dqozpi",
            "address;m/44'/148'/0';GADQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOZPI;extra",
            "signature;deadbeef",
        ] {
            assert!(
                matches!(
                    parse_address_reply(raw, "44'/148'/0'", &StrkeyValidator),
                    Err(AppError::MalformedPayload(_))
                ),
                "{raw:?} should be malformed"
            );
        }
    }

    #[test]
    fn bad_checksum_is_invalid_key() {
        let raw = reply(
            "44'/148'/0'",
            "GADQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOZPA",
        );
        assert!(matches!(
            parse_address_reply(&raw, "44'/148'/0'", &StrkeyValidator),
            Err(AppError::InvalidKey(_))
        ));
    }

    #[test]
    fn signature_blob_is_returned_verbatim() {
        assert_eq!(parse_signature_reply("signature;deadbeef").unwrap(), "deadbeef");
        assert_eq!(
            parse_signature_reply("signature;x+/S0g==").unwrap(),
            "x+/S0g=="
        );
        // Only the second field is the signature, even when it is empty.
        assert_eq!(parse_signature_reply("signature;abc;def").unwrap(), "abc");
        assert_eq!(parse_signature_reply("signature;;abc").unwrap(), "");
    }

    #[test]
    fn non_signature_payloads_are_malformed() {
        for raw in ["not-a-signature", "signature;", "signature", "Signature;abc"] {
            assert!(
                matches!(parse_signature_reply(raw), Err(AppError::MalformedPayload(_))),
                "{raw:?} should be malformed"
            );
        }
    }
}
