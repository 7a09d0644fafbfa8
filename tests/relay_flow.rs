use std::collections::BTreeMap;

use lumensigner_relay::errors::AppError;
use lumensigner_relay::scanner::ChannelScanSource;
use lumensigner_relay::session::{ConfirmStep, SignInStep};
use lumensigner_relay::wallet::{
    AccountFetcher, StrkeyValidator, TransactionEnvelope, TransactionSubmitter,
};
use lumensigner_relay::{
    BipPath, ConfirmSession, Frame, LumenSignerSettings, Network, SignInSession, reassemble,
};

const PUBLIC_KEY: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";
// Base64 of a made-up envelope, long enough for three frames
const ENVELOPE: &str = "AAAAAgAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAGQAAAAAAAAAAQAAAAAAAAAAAAAAAQAAAAAAAAABAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

#[derive(Default)]
struct Accounts {
    loaded: Vec<String>,
}

impl AccountFetcher for Accounts {
    async fn fetch_account(&mut self, public_key: &str) -> Result<(), AppError> {
        self.loaded.push(public_key.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct PaymentTx {
    signatures: BTreeMap<String, String>,
}

impl TransactionEnvelope for PaymentTx {
    fn serialize_to_envelope(&self) -> String {
        ENVELOPE.to_string()
    }

    fn add_signature(&mut self, account_id: &str, signature: &str) {
        self.signatures
            .insert(account_id.to_string(), signature.to_string());
    }
}

#[derive(Default)]
struct Horizon {
    broadcast: usize,
}

impl TransactionSubmitter<PaymentTx> for Horizon {
    async fn submit(&mut self, tx: &PaymentTx) -> Result<(), AppError> {
        assert!(!tx.signatures.is_empty());
        self.broadcast += 1;
        Ok(())
    }
}

#[tokio::test]
async fn pair_with_device_over_camera() {
    let mut session = SignInSession::new(BipPath::default(), StrkeyValidator, Accounts::default());
    session.set_bip_path("m/44'/148'/3'").unwrap();
    let request = session.connect();
    assert_eq!(request, "request-address;m/44'/148'/3'");

    let (feed, mut camera) = ChannelScanSource::channel(8);
    // Unrelated codes and a reply for another account come first.
    assert!(feed.offer("https://example.com"));
    assert!(feed.offer(format!("address;m/44'/148'/0';{PUBLIC_KEY}")));
    assert!(feed.offer(format!("address;m/44'/148'/3';{PUBLIC_KEY}")));

    let key = session.run(&mut camera).await.unwrap();
    assert_eq!(key.public_key, PUBLIC_KEY);
    assert_eq!(key.path, BipPath::stellar_account(3));
    assert_eq!(session.step(), SignInStep::Paired);
    assert_eq!(session.error_message(), None);
}

#[tokio::test(start_paused = true)]
async fn sign_transaction_through_rotating_frames() {
    let settings = LumenSignerSettings {
        network: Network::Testnet,
        ..LumenSignerSettings::default()
    };
    let mut session = ConfirmSession::new(
        PaymentTx::default(),
        Some(PUBLIC_KEY.to_string()),
        settings,
        Horizon::default(),
    );

    let mut display = session.submit().unwrap();
    let first = session.current_frame().unwrap();
    let total = first.total_frames;
    assert!(total >= 3);

    let (feed, mut camera) = ChannelScanSource::channel(8);

    // The device scans whatever is on screen until it has every part.
    let device = tokio::spawn(async move {
        let mut parts: BTreeMap<usize, Frame> = BTreeMap::new();
        let mut frame = first;
        loop {
            let text = frame.to_string();
            let scanned: Frame = text.parse().unwrap();
            parts.insert(scanned.sequence_index, scanned);
            if parts.len() == total {
                break;
            }
            display.changed().await.unwrap();
            frame = display.borrow_and_update().clone();
        }
        let payload = reassemble(parts.into_values()).unwrap();
        feed.offer("signature;c2lnbmF0dXJlLWJ5dGVz");
        payload
    });

    let payload = device.await.unwrap();
    assert_eq!(
        payload,
        format!("m/44'/148'/0';{ENVELOPE};Test SDF Network ; September 2015")
    );

    session.continue_to_signature();
    assert!(!session.is_displaying());

    let signature = session.run(&mut camera).await.unwrap();
    assert_eq!(signature, "c2lnbmF0dXJlLWJ5dGVz");
    assert_eq!(session.step(), ConfirmStep::Submitted);

    let tx = session.into_transaction();
    assert_eq!(
        tx.signatures.get(PUBLIC_KEY).map(String::as_str),
        Some("c2lnbmF0dXJlLWJ5dGVz")
    );
}
