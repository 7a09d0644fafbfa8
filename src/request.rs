//! Requests the wallet shows to the device.

use std::fmt;
use std::str::FromStr;

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

use crate::constants::{Command, FIELD_SEPARATOR, PUBLIC_PASSPHRASE, TESTNET_PASSPHRASE};
use crate::errors::AppError;
use crate::frames::{Frame, encode_frames};
use crate::path::BipPath;
use crate::wallet::TransactionEnvelope;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Network {
    #[default]
    Public,
    Testnet,
}

impl Network {
    pub fn passphrase(&self) -> &'static str {
        match self {
            Network::Public => PUBLIC_PASSPHRASE,
            Network::Testnet => TESTNET_PASSPHRASE,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Public => f.write_str("public"),
            Network::Testnet => f.write_str("testnet"),
        }
    }
}

impl FromStr for Network {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "public" | "mainnet" | "pubnet" => Ok(Network::Public),
            "testnet" => Ok(Network::Testnet),
            other => Err(AppError::Settings(format!("unknown network '{other}'"))),
        }
    }
}

impl TryFrom<String> for Network {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Network> for String {
    fn from(network: Network) -> Self {
        network.to_string()
    }
}

/// `request-address;m/{path}`, shown once while pairing.
pub fn address_request(path: &BipPath) -> String {
    format!(
        "{}{FIELD_SEPARATOR}{}",
        Command::RequestAddress,
        path.with_prefix()
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    derivation_path: BipPath,
    transaction_envelope: String,
    network: Network,
}

impl SigningRequest {
    pub fn new(
        derivation_path: BipPath,
        transaction_envelope: String,
        network: Network,
    ) -> Result<Self, AppError> {
        let envelope = transaction_envelope.trim();
        if envelope.is_empty() {
            return Err(AppError::InvalidTransaction(
                "transaction envelope is empty".to_string(),
            ));
        }
        general_purpose::STANDARD.decode(envelope).map_err(|e| {
            AppError::InvalidTransaction(format!("envelope is not base64 XDR: {e}"))
        })?;

        Ok(Self {
            derivation_path,
            transaction_envelope: envelope.to_string(),
            network,
        })
    }

    pub fn from_transaction<T: TransactionEnvelope + ?Sized>(
        tx: &T,
        derivation_path: BipPath,
        network: Network,
    ) -> Result<Self, AppError> {
        Self::new(derivation_path, tx.serialize_to_envelope(), network)
    }

    pub fn derivation_path(&self) -> &BipPath {
        &self.derivation_path
    }

    pub fn transaction_envelope(&self) -> &str {
        &self.transaction_envelope
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// `m/{path};{envelope};{passphrase}`
    pub fn payload(&self) -> String {
        format!(
            "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}",
            self.derivation_path.with_prefix(),
            self.transaction_envelope,
            self.network.passphrase()
        )
    }

    pub fn frames(&self, chunk_size: usize) -> Result<Vec<Frame>, AppError> {
        encode_frames(&self.payload(), chunk_size, Command::SignTransaction)
    }
}
