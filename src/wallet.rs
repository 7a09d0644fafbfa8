//! Interfaces to the rest of the wallet: the transaction object, key
//! validation, account lookup and broadcast.

use std::future::Future;

use crate::errors::AppError;

/// The transaction being signed. Implemented by the wallet's transaction type.
pub trait TransactionEnvelope {
    /// Base64 XDR of the transaction envelope.
    fn serialize_to_envelope(&self) -> String;

    fn add_signature(&mut self, account_id: &str, signature: &str);
}

pub trait KeyValidator {
    fn is_valid_public_key(&self, public_key: &str) -> bool;
}

/// Accepts Stellar `G...` account ids with a valid checksum.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrkeyValidator;

impl KeyValidator for StrkeyValidator {
    fn is_valid_public_key(&self, public_key: &str) -> bool {
        stellar_strkey::ed25519::PublicKey::from_string(public_key).is_ok()
    }
}

impl<F> KeyValidator for F
where
    F: Fn(&str) -> bool,
{
    fn is_valid_public_key(&self, public_key: &str) -> bool {
        self(public_key)
    }
}

/// Loads the account behind a freshly paired key.
pub trait AccountFetcher {
    fn fetch_account(&mut self, public_key: &str) -> impl Future<Output = Result<(), AppError>>;
}

/// Broadcasts a signed transaction.
pub trait TransactionSubmitter<T: TransactionEnvelope> {
    fn submit(&mut self, tx: &T) -> impl Future<Output = Result<(), AppError>>;
}
