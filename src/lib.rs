//! Wallet side of the LumenSigner QR relay.
//!
//! The wallet shows a `request-address` QR to pair, then shows a signing
//! request as a rotating sequence of `sign-transaction` frames. The device
//! answers with `address` and `signature` QR codes read from the camera.

pub mod constants;
pub mod cycler;
pub mod errors;
pub mod frames;
pub mod path;
pub mod reply;
pub mod request;
pub mod scanner;
pub mod session;
pub mod settings;
pub mod types;
pub mod utils;
pub mod wallet;

pub use errors::AppError;
pub use frames::{Frame, encode_frames, reassemble, split};
pub use path::BipPath;
pub use reply::{parse_address_reply, parse_signature_reply};
pub use request::{Network, SigningRequest, address_request};
pub use session::{ConfirmSession, SignInSession};
pub use settings::LumenSignerSettings;
