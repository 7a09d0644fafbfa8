//! Constants and protocol definitions for LumenSigner QR communication

use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

// Frame sizing (matching the web wallet implementation)
pub const CHUNK_SIZE: usize = 80;
pub const FRAME_INTERVAL_MS: u64 = 1000;
// Upper bound on the part count a frame header may claim
pub const MAX_FRAMES: usize = 1024;

pub const DEFAULT_BIP_PATH: &str = "44'/148'/0'";
// SLIP-0044 coin type for Stellar
pub const STELLAR_COIN_TYPE: u32 = 148;
pub const BIP44_PURPOSE: u32 = 44;
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

pub const PUBLIC_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";

pub const FIELD_SEPARATOR: char = ';';

// Reply patterns shown by the device
pub const ADDRESS_REPLY_PATTERN: &str = r"^address;m/44'/148'/\d+';[A-Z0-9]{56}$";
pub const SIGNATURE_REPLY_PATTERN: &str = r"^signature;(.+)$";

/// Commands carried in the first field of every QR payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    // Wallet to device
    RequestAddress,
    SignTransaction,
    // Device to wallet
    Address,
    Signature,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::RequestAddress => "request-address",
            Command::SignTransaction => "sign-transaction",
            Command::Address => "address",
            Command::Signature => "signature",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "request-address" => Ok(Command::RequestAddress),
            "sign-transaction" => Ok(Command::SignTransaction),
            "address" => Ok(Command::Address),
            "signature" => Ok(Command::Signature),
            other => Err(AppError::UnexpectedCommand(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_names_parse_back() {
        for command in [
            Command::RequestAddress,
            Command::SignTransaction,
            Command::Address,
            Command::Signature,
        ] {
            assert_eq!(command.as_str().parse::<Command>().unwrap(), command);
        }
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(matches!(
            "get-version".parse::<Command>(),
            Err(AppError::UnexpectedCommand(c)) if c == "get-version"
        ));
    }
}
