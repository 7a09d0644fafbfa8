use anyhow::anyhow;
use lumensigner_relay::cycler::FrameCycler;
use lumensigner_relay::path::BipPath;
use lumensigner_relay::reply::{parse_address_reply, parse_signature_reply};
use lumensigner_relay::request::{SigningRequest, address_request};
use lumensigner_relay::settings::LumenSignerSettings;
use lumensigner_relay::types::*;
use lumensigner_relay::utils::init_logging;
use lumensigner_relay::wallet::StrkeyValidator;
use lumensigner_relay::{Frame, reassemble};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io::{BufRead, Write, stdin, stdout};
use std::{io, panic};
use tracing::{info, warn};

#[derive(Serialize, Deserialize, Debug)]
pub struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: serde_json::Value,
    id: u64,
}

#[tokio::main]
pub async fn main() {
    init_logging();
    let reader = stdin();
    set_panic_hook();
    let buf_reader = io::BufReader::new(reader);
    match run_cli(buf_reader).await {
        Ok(result) => match serde_json::to_string(&result) {
            Ok(text) => println!("{text}"),
            Err(e) => return_error(&e.to_string()),
        },
        Err(e) => {
            return_error(&e.to_string());
        }
    }
}

pub fn set_panic_hook() {
    panic::set_hook(Box::new(move |info| {
        let payload = if let Some(payload) = info.payload().downcast_ref::<String>().or(info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .as_ref())
        {
            payload.clone()
        } else {
            "unknown panic".to_string()
        };

        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());

        let json = json!({
            "error": {
                "code": 1,
                "message": "Panic occurred",
                "data": {
                    "payload": payload,
                    "location": location,
                }
            },
        });

        let _ = writeln!(stdout(), "{json}");
    }));
}

pub async fn run_cli<R: BufRead>(buf_reader: R) -> Result<Value, anyhow::Error> {
    if std::env::args().nth(1).as_deref() != Some("call") {
        eprintln!("This tool is meant to be called with 'call' as the first argument");
        std::process::exit(1);
    }

    let JsonRpcRequest {
        jsonrpc: _,
        method,
        params,
        id: _,
    } = read_json_line(buf_reader)?;

    if method.is_empty() {
        return Err(anyhow!("Method is required"));
    }

    let settings_path = LumenSignerSettings::env_path();
    let settings = LumenSignerSettings::load_or_default(settings_path.as_deref())?;

    match method.as_str() {
        "request_address" => {
            let args = parse_params::<AddressRequestArgs>(params)?;
            let path = resolve_path(args.bip_path.as_deref(), &settings)?;
            Ok(serde_json::to_value(AddressRequestResponse {
                key_id: path.to_string(),
                qr: address_request(&path),
            })?)
        }
        "keys" => {
            let keys = (0..5)
                .map(|i| {
                    let path = BipPath::stellar_account(i);
                    AddressRequestResponse {
                        key_id: path.to_string(),
                        qr: address_request(&path),
                    }
                })
                .collect();
            Ok(serde_json::to_value(KeysResponse { keys })?)
        }
        "read_address" => {
            let args = parse_params::<ReadAddressArgs>(params)?;
            let path = resolve_path(args.bip_path.as_deref(), &settings)?;
            let public_key = parse_address_reply(&args.qr, path.as_str(), &StrkeyValidator)
                .inspect_err(|e| {
                    warn!(data = %args.qr, error = %e, "login: saw connect with lumensigner error")
                })?;
            info!(public_key = %public_key, path = %path, "login: connected with LumenSigner");

            if let Some(file) = settings_path.as_deref() {
                let updated = LumenSignerSettings {
                    bip_path: path.clone(),
                    ..settings
                };
                updated.save_to_file(file)?;
            }

            Ok(serde_json::to_value(PublicKeyResponse {
                key_id: path.to_string(),
                public_key,
            })?)
        }
        "sign_request" => {
            let args = parse_params::<SignRequestArgs>(params)?;
            let path = resolve_path(args.bip_path.as_deref(), &settings)?;
            let network = args.network.unwrap_or(settings.network);
            let chunk_size = args.chunk_size.unwrap_or(settings.chunk_size);

            let request = SigningRequest::new(path.clone(), args.envelope, network)?;
            let frames = request.frames(chunk_size)?;
            info!(frames = frames.len(), network = %network, "send: confirmed transaction");

            if let Some(ticks) = args.ticks {
                show_frames(frames.clone(), ticks, &settings).await?;
            }

            Ok(serde_json::to_value(SignRequestResponse {
                key_id: path.to_string(),
                network,
                total_frames: frames.len(),
                frames: frames.iter().map(Frame::to_string).collect(),
            })?)
        }
        "read_signature" => {
            let args = parse_params::<ReadSignatureArgs>(params)?;
            let signature = parse_signature_reply(&args.qr)?;
            Ok(serde_json::to_value(SignatureResponse { signature })?)
        }
        "reassemble" => {
            let args = parse_params::<ReassembleArgs>(params)?;
            let frames = args
                .frames
                .iter()
                .map(|f| f.parse::<Frame>())
                .collect::<Result<Vec<_>, _>>()?;
            Ok(serde_json::to_value(ReassembleResponse {
                payload: reassemble(frames)?,
            })?)
        }
        _ => Err(anyhow!("Invalid method: {}", method)),
    }
}

/// Rotate the frames on the configured interval, writing each one to stderr.
async fn show_frames(
    frames: Vec<Frame>,
    ticks: usize,
    settings: &LumenSignerSettings,
) -> Result<(), anyhow::Error> {
    let guard = FrameCycler::new(frames)?.spawn(settings.frame_interval())?;
    let mut updates = guard.subscribe();
    eprintln!("{}", guard.current());
    for _ in 0..ticks {
        updates.changed().await?;
        eprintln!("{}", *updates.borrow_and_update());
    }
    Ok(())
}

fn resolve_path(
    requested: Option<&str>,
    settings: &LumenSignerSettings,
) -> Result<BipPath, anyhow::Error> {
    match requested {
        Some(p) if !p.is_empty() => Ok(BipPath::parse(p)?),
        _ => Ok(settings.bip_path.clone()),
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, anyhow::Error> {
    let params = if params.is_null() { json!({}) } else { params };
    serde_json::from_value(params).map_err(|e| anyhow!("Failed to parse arguments: {e}"))
}

fn return_error(message: &str) {
    println!(
        "{}",
        json!({
            "error": {
                "code": 1,
                "message": message,
            },
        })
    );
}

pub fn read_json_line<R: BufRead>(mut buf_reader: R) -> Result<JsonRpcRequest, anyhow::Error> {
    let mut input = String::new();
    buf_reader.read_line(&mut input)?;
    Ok(serde_json::from_str(&input)?)
}
