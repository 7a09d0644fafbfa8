//! API request and response types for the LumenSigner relay CLI
use serde::{Deserialize, Serialize};

use crate::request::Network;

#[derive(Debug, Serialize, Deserialize)]
pub struct AddressRequestArgs {
    #[serde(default)]
    pub bip_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddressRequestResponse {
    pub key_id: String,
    pub qr: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KeysResponse {
    pub keys: Vec<AddressRequestResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadAddressArgs {
    #[serde(default)]
    pub bip_path: Option<String>,
    pub qr: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublicKeyResponse {
    pub key_id: String,
    pub public_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignRequestArgs {
    pub envelope: String,
    #[serde(default)]
    pub bip_path: Option<String>,
    #[serde(default)]
    pub network: Option<Network>,
    #[serde(default)]
    pub chunk_size: Option<usize>,
    /// Stream this many rotations to stderr before answering.
    #[serde(default)]
    pub ticks: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignRequestResponse {
    pub key_id: String,
    pub network: Network,
    pub total_frames: usize,
    pub frames: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadSignatureArgs {
    pub qr: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignatureResponse {
    pub signature: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReassembleArgs {
    pub frames: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReassembleResponse {
    pub payload: String,
}
