//! BIP-32 derivation paths as entered by the user and shown to the device.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{BIP44_PURPOSE, HARDENED_OFFSET, STELLAR_COIN_TYPE};
use crate::errors::AppError;

/// A derivation path kept in the textual form the device expects, without the
/// leading `m/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BipPath {
    text: String,
    components: Vec<u32>,
}

impl BipPath {
    pub fn parse(input: &str) -> Result<Self, AppError> {
        let normalized = normalize_path(input);
        let text = normalized
            .strip_prefix("m/")
            .unwrap_or(&normalized)
            .to_string();
        let components = split_path(&text)?;
        Ok(Self { text, components })
    }

    /// The default Stellar path for the given account index.
    pub fn stellar_account(index: u32) -> Self {
        let text = get_derivation_path(index);
        let components = vec![
            BIP44_PURPOSE | HARDENED_OFFSET,
            STELLAR_COIN_TYPE | HARDENED_OFFSET,
            index | HARDENED_OFFSET,
        ];
        Self { text, components }
    }

    pub fn components(&self) -> &[u32] {
        &self.components
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// `m/`-prefixed form used on the wire.
    pub fn with_prefix(&self) -> String {
        format!("m/{}", self.text)
    }

    /// True for `44'/148'/N'`, the only shape the device answers for.
    pub fn is_stellar_account(&self) -> bool {
        matches!(
            self.components.as_slice(),
            [purpose, coin, account]
                if *purpose == BIP44_PURPOSE | HARDENED_OFFSET
                    && *coin == STELLAR_COIN_TYPE | HARDENED_OFFSET
                    && account & HARDENED_OFFSET != 0
        )
    }

    pub fn account_index(&self) -> Option<u32> {
        self.is_stellar_account()
            .then(|| self.components[2] & !HARDENED_OFFSET)
    }
}

impl Default for BipPath {
    fn default() -> Self {
        Self::stellar_account(0)
    }
}

impl fmt::Display for BipPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for BipPath {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BipPath {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BipPath> for String {
    fn from(path: BipPath) -> Self {
        path.text
    }
}

pub fn get_derivation_path(index: u32) -> String {
    format!("{BIP44_PURPOSE}'/{STELLAR_COIN_TYPE}'/{index}'")
}

/// Replace typographic quotes and stray escapes with a plain apostrophe.
pub fn normalize_path(path: &str) -> String {
    path.trim()
        .replace("\\'", "'")
        .replace('\u{2019}', "'") // RIGHT SINGLE QUOTATION MARK
        .replace('\u{2018}', "'") // LEFT SINGLE QUOTATION MARK
        .replace('\u{2032}', "'") // PRIME
        .replace('\u{201B}', "'")
        .replace(['\u{201C}', '\u{201D}', '"'], "'")
        .replace("''", "'")
}

/// Split a path such as `44'/148'/0'` into BIP-32 indices.
pub fn split_path(path: &str) -> Result<Vec<u32>, AppError> {
    if path.is_empty() {
        return Err(AppError::InvalidPath("path is empty".to_string()));
    }

    path.split('/')
        .map(|segment| {
            let (digits, hardened) = match segment.strip_suffix('\'') {
                Some(digits) => (digits, true),
                None => (segment, false),
            };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(AppError::InvalidPath(format!(
                    "invalid segment '{segment}' in '{path}'"
                )));
            }
            let index: u32 = digits.parse().map_err(|_| {
                AppError::InvalidPath(format!("segment '{segment}' is out of range"))
            })?;
            if index >= HARDENED_OFFSET {
                return Err(AppError::InvalidPath(format!(
                    "segment '{segment}' is out of range"
                )));
            }
            Ok(if hardened { index | HARDENED_OFFSET } else { index })
        })
        .collect()
}
