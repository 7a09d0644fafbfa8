//! Sign-in (pairing) and confirm (signing) flows.
//!
//! Each flow is an owned session value created when the user enters it and
//! dropped when they leave. The confirm session owns the frame cycler guard, so
//! leaving the frame step in any way stops the rotation.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cycler::{CyclerGuard, FrameCycler};
use crate::errors::{AppError, GENERIC_FAILURE_MESSAGE};
use crate::frames::Frame;
use crate::path::BipPath;
use crate::reply::{parse_address_reply, parse_signature_reply};
use crate::request::{SigningRequest, address_request};
use crate::scanner::ScanSource;
use crate::settings::LumenSignerSettings;
use crate::wallet::{AccountFetcher, KeyValidator, TransactionEnvelope, TransactionSubmitter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    LumenSigner,
}

/// Key stored after a successful pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedKey {
    pub public_key: String,
    pub path: BipPath,
    pub key_type: KeyType,
}

#[derive(Debug)]
pub enum ScanOutcome<T> {
    Accepted(T),
    Rejected(AppError),
    /// Not acted upon; nothing shown to the user.
    Ignored,
}

impl<T> ScanOutcome<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ScanOutcome::Accepted(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInStep {
    Configure,
    RequestAddress,
    ReceiveAddress,
    Paired,
}

pub struct SignInSession<V, F> {
    step: SignInStep,
    bip_path: BipPath,
    validator: V,
    fetcher: F,
    error_message: Option<&'static str>,
    paired: Option<PairedKey>,
}

impl<V, F> SignInSession<V, F>
where
    V: KeyValidator,
    F: AccountFetcher,
{
    pub fn new(bip_path: BipPath, validator: V, fetcher: F) -> Self {
        Self {
            step: SignInStep::Configure,
            bip_path,
            validator,
            fetcher,
            error_message: None,
            paired: None,
        }
    }

    pub fn step(&self) -> SignInStep {
        self.step
    }

    pub fn bip_path(&self) -> &BipPath {
        &self.bip_path
    }

    pub fn error_message(&self) -> Option<&'static str> {
        self.error_message
    }

    pub fn paired_key(&self) -> Option<&PairedKey> {
        self.paired.as_ref()
    }

    pub fn set_bip_path(&mut self, input: &str) -> Result<(), AppError> {
        if self.step != SignInStep::Configure {
            return Err(AppError::InvalidPath(
                "path can only be changed before connecting".to_string(),
            ));
        }
        self.bip_path = BipPath::parse(input)?;
        Ok(())
    }

    /// Move to the request step and return the QR text to display.
    pub fn connect(&mut self) -> String {
        self.step = SignInStep::RequestAddress;
        address_request(&self.bip_path)
    }

    pub fn continue_to_scan(&mut self) {
        if self.step == SignInStep::RequestAddress {
            self.step = SignInStep::ReceiveAddress;
        }
    }

    pub fn back(&mut self) {
        self.step = SignInStep::Configure;
        self.error_message = None;
        self.paired = None;
    }

    pub async fn handle_scan(&mut self, raw: &str) -> ScanOutcome<PairedKey> {
        if self.step != SignInStep::ReceiveAddress {
            return ScanOutcome::Ignored;
        }
        self.error_message = None;

        let public_key =
            match parse_address_reply(raw, self.bip_path.as_str(), &self.validator) {
                Ok(key) => key,
                Err(e) => {
                    self.error_message = Some(e.user_message());
                    warn!(data = raw, error = %e, "login: saw connect with lumensigner error");
                    return ScanOutcome::Rejected(e);
                }
            };

        if let Err(e) = self.fetcher.fetch_account(&public_key).await {
            self.error_message = Some(GENERIC_FAILURE_MESSAGE);
            warn!(error = %e, "login: saw connect with LumenSigner error");
            return ScanOutcome::Rejected(e);
        }

        let key = PairedKey {
            public_key,
            path: self.bip_path.clone(),
            key_type: KeyType::LumenSigner,
        };
        self.step = SignInStep::Paired;
        self.paired = Some(key.clone());
        info!(public_key = %key.public_key, path = %key.path, "login: connected with LumenSigner");
        ScanOutcome::Accepted(key)
    }

    /// Read scans until one pairs. Rejected scans leave the session waiting for
    /// the next one.
    pub async fn run<S: ScanSource>(&mut self, source: &mut S) -> Result<PairedKey, AppError> {
        self.continue_to_scan();
        while let Some(scan) = source.next_scan().await {
            let raw = match scan {
                Ok(raw) => raw,
                Err(e) => {
                    self.error_message = Some(e.user_message());
                    return Err(e);
                }
            };
            if let ScanOutcome::Accepted(key) = self.handle_scan(&raw).await {
                return Ok(key);
            }
        }
        Err(AppError::Collaborator("camera closed before pairing".to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmStep {
    Review,
    DisplayingFrames,
    ReadingSignature,
    Submitted,
    Failed,
    Cancelled,
}

pub struct ConfirmSession<T, S> {
    tx: T,
    account_id: Option<String>,
    settings: LumenSignerSettings,
    submitter: S,
    step: ConfirmStep,
    request: Option<SigningRequest>,
    cycler: Option<CyclerGuard>,
}

impl<T, S> ConfirmSession<T, S>
where
    T: TransactionEnvelope,
    S: TransactionSubmitter<T>,
{
    pub fn new(
        tx: T,
        account_id: Option<String>,
        settings: LumenSignerSettings,
        submitter: S,
    ) -> Self {
        info!("send: saw confirmation screen");
        Self {
            tx,
            account_id,
            settings,
            submitter,
            step: ConfirmStep::Review,
            request: None,
            cycler: None,
        }
    }

    pub fn step(&self) -> ConfirmStep {
        self.step
    }

    pub fn transaction(&self) -> &T {
        &self.tx
    }

    pub fn into_transaction(self) -> T {
        self.tx
    }

    pub fn signing_request(&self) -> Option<&SigningRequest> {
        self.request.as_ref()
    }

    pub fn current_frame(&self) -> Option<Frame> {
        self.cycler.as_ref().map(CyclerGuard::current)
    }

    pub fn is_displaying(&self) -> bool {
        self.cycler.is_some()
    }

    /// Build the signing request and start rotating its frames. Must be called
    /// from within a tokio runtime.
    pub fn submit(&mut self) -> Result<watch::Receiver<Frame>, AppError> {
        let request = SigningRequest::from_transaction(
            &self.tx,
            self.settings.bip_path.clone(),
            self.settings.network,
        )?;
        let frames = request.frames(self.settings.chunk_size)?;
        let total = frames.len();
        let guard = FrameCycler::new(frames)?.spawn(self.settings.frame_interval())?;
        let updates = guard.subscribe();

        info!(
            frames = total,
            network = %request.network(),
            path = %request.derivation_path(),
            "send: confirmed transaction"
        );
        self.request = Some(request);
        self.cycler = Some(guard);
        self.step = ConfirmStep::DisplayingFrames;
        Ok(updates)
    }

    /// Stop the frames and start reading the device's reply.
    pub fn continue_to_signature(&mut self) {
        if self.step == ConfirmStep::DisplayingFrames {
            self.cycler = None;
            self.step = ConfirmStep::ReadingSignature;
        }
    }

    pub fn back(&mut self) {
        self.teardown();
        self.step = ConfirmStep::Review;
    }

    pub fn cancel(&mut self) {
        self.teardown();
        self.step = ConfirmStep::Cancelled;
    }

    fn teardown(&mut self) {
        self.cycler = None;
        self.request = None;
    }

    /// Apply a scanned signature. Payloads that are not signature replies are
    /// dropped without a message.
    pub async fn handle_scan(&mut self, raw: &str) -> ScanOutcome<String> {
        if self.step != ConfirmStep::ReadingSignature {
            return ScanOutcome::Ignored;
        }
        let Some(account_id) = self.account_id.as_deref() else {
            return ScanOutcome::Ignored;
        };
        let signature = match parse_signature_reply(raw) {
            Ok(signature) => signature,
            Err(e) => {
                debug!(error = %e, "ignoring scan");
                return ScanOutcome::Ignored;
            }
        };

        self.tx.add_signature(account_id, &signature);
        match self.submitter.submit(&self.tx).await {
            Ok(()) => {
                self.step = ConfirmStep::Submitted;
                self.request = None;
                info!("send: saw send success message");
                ScanOutcome::Accepted(signature)
            }
            Err(e) => {
                self.step = ConfirmStep::Failed;
                warn!(message = %e, "send: saw send error message");
                ScanOutcome::Rejected(e)
            }
        }
    }

    /// Read scans until a signature is applied and the transaction submitted.
    pub async fn run<R: ScanSource>(&mut self, source: &mut R) -> Result<String, AppError> {
        self.continue_to_signature();
        while let Some(scan) = source.next_scan().await {
            match self.handle_scan(&scan?).await {
                ScanOutcome::Accepted(signature) => return Ok(signature),
                ScanOutcome::Rejected(e) => return Err(e),
                ScanOutcome::Ignored => {}
            }
        }
        Err(AppError::Collaborator("camera closed before a signature was read".to_string()))
    }
}
