//! Splitting a payload into QR-sized frames and putting it back together.
//!
//! A frame renders as `p{index}of{total};{command};{chunk}` with a 1-based
//! index. The device collects every index before acting on the payload, so
//! frames may be shown (and scanned) in any order.

use std::fmt;
use std::str::FromStr;

use crate::constants::{Command, FIELD_SEPARATOR, MAX_FRAMES};
use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub sequence_index: usize,
    pub total_frames: usize,
    pub command: Command,
    pub payload: String,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "p{}of{}{sep}{}{sep}{}",
            self.sequence_index,
            self.total_frames,
            self.command,
            self.payload,
            sep = FIELD_SEPARATOR
        )
    }
}

impl FromStr for Frame {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The payload may itself contain separators (network passphrases do).
        let mut fields = s.splitn(3, FIELD_SEPARATOR);
        let header = fields.next().unwrap_or_default();
        let command = fields
            .next()
            .ok_or_else(|| AppError::InvalidFrame(format!("missing command in '{s}'")))?;
        let payload = fields
            .next()
            .ok_or_else(|| AppError::InvalidFrame(format!("missing payload in '{s}'")))?;

        let (index, total) = header
            .strip_prefix('p')
            .and_then(|rest| rest.split_once("of"))
            .ok_or_else(|| AppError::InvalidFrame(format!("bad header '{header}'")))?;
        let sequence_index: usize = index
            .parse()
            .map_err(|_| AppError::InvalidFrame(format!("bad index '{index}'")))?;
        let total_frames: usize = total
            .parse()
            .map_err(|_| AppError::InvalidFrame(format!("bad total '{total}'")))?;
        if total_frames > MAX_FRAMES {
            return Err(AppError::InvalidFrame(format!(
                "{total_frames} parts exceeds the limit of {MAX_FRAMES}"
            )));
        }
        if sequence_index == 0 || sequence_index > total_frames {
            return Err(AppError::InvalidFrame(format!(
                "index {sequence_index} outside 1..={total_frames}"
            )));
        }

        Ok(Frame {
            sequence_index,
            total_frames,
            command: command.parse()?,
            payload: payload.to_string(),
        })
    }
}

/// Cut `text` into `ceil(len / chunk_size)` pieces of `chunk_size` characters,
/// the last one possibly shorter. Empty input gives one empty chunk.
pub fn split(text: &str, chunk_size: usize) -> Result<Vec<String>, AppError> {
    if chunk_size == 0 {
        return Err(AppError::InvalidChunkSize);
    }
    if text.is_empty() {
        return Ok(vec![String::new()]);
    }

    let chars: Vec<char> = text.chars().collect();
    Ok(chars
        .chunks(chunk_size)
        .map(|chunk| chunk.iter().collect())
        .collect())
}

pub fn encode_frames(
    text: &str,
    chunk_size: usize,
    command: Command,
) -> Result<Vec<Frame>, AppError> {
    let chunks = split(text, chunk_size)?;
    let total_frames = chunks.len();
    Ok(chunks
        .into_iter()
        .enumerate()
        .map(|(i, payload)| Frame {
            sequence_index: i + 1,
            total_frames,
            command,
            payload,
        })
        .collect())
}

/// Rebuild a payload from frames received in any order.
pub fn reassemble<I>(frames: I) -> Result<String, AppError>
where
    I: IntoIterator<Item = Frame>,
{
    let mut slots: Vec<Option<String>> = Vec::new();
    let mut command: Option<Command> = None;

    for frame in frames {
        if frame.total_frames == 0 || frame.total_frames > MAX_FRAMES {
            return Err(AppError::InvalidFrame(format!(
                "frame {} claims {} parts",
                frame.sequence_index, frame.total_frames
            )));
        }
        if slots.is_empty() {
            slots = vec![None; frame.total_frames];
        } else if slots.len() != frame.total_frames {
            return Err(AppError::InvalidFrame(format!(
                "frame {} claims {} parts, expected {}",
                frame.sequence_index,
                frame.total_frames,
                slots.len()
            )));
        }
        match command {
            Some(c) if c != frame.command => {
                return Err(AppError::InvalidFrame(format!(
                    "mixed commands '{c}' and '{}'",
                    frame.command
                )));
            }
            _ => command = Some(frame.command),
        }

        let slot = slots
            .get_mut(frame.sequence_index.wrapping_sub(1))
            .ok_or_else(|| {
                AppError::InvalidFrame(format!("index {} out of range", frame.sequence_index))
            })?;
        match slot {
            Some(existing) if *existing != frame.payload => {
                return Err(AppError::InvalidFrame(format!(
                    "conflicting contents for part {}",
                    frame.sequence_index
                )));
            }
            Some(_) => {}
            None => *slot = Some(frame.payload),
        }
    }

    if slots.is_empty() {
        return Err(AppError::EmptyFrames);
    }

    let missing: Vec<usize> = slots
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_none())
        .map(|(i, _)| i + 1)
        .collect();
    if !missing.is_empty() {
        return Err(AppError::InvalidFrame(format!("missing parts {missing:?}")));
    }

    Ok(slots.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_every_character() {
        let text = "m/44'/148'/0';AAAAAgAAAAB+Ecs01jX14asC;Test SDF Network ; September 2015";
        for k in [1, 3, 7, 80, 500] {
            let chunks = split(text, k).unwrap();
            assert_eq!(chunks.concat(), text);
            let (last, body) = chunks.split_last().unwrap();
            assert!(body.iter().all(|c| c.chars().count() == k));
            assert!(!last.is_empty() && last.chars().count() <= k);
            assert_eq!(chunks.len(), text.len().div_ceil(k));
        }
    }

    #[test]
    fn split_of_empty_text_is_one_empty_chunk() {
        assert_eq!(split("", 80).unwrap(), vec![String::new()]);
    }

    #[test]
    fn split_rejects_zero_chunk_size() {
        assert!(matches!(split("abc", 0), Err(AppError::InvalidChunkSize)));
    }

    #[test]
    fn split_never_cuts_a_code_point() {
        let chunks = split("añb€c", 2).unwrap();
        assert_eq!(chunks, vec!["añ", "b€", "c"]);
    }

    #[test]
    fn two_hundred_characters_make_three_frames() {
        let text = "x".repeat(200);
        let frames = encode_frames(&text, 80, Command::SignTransaction).unwrap();
        let sizes: Vec<usize> = frames.iter().map(|f| f.payload.len()).collect();
        assert_eq!(sizes, vec![80, 80, 40]);
        assert_eq!(frames[2].to_string(), format!("p3of3;sign-transaction;{}", "x".repeat(40)));
    }

    #[test]
    fn frame_text_parses_back_with_separators_in_payload() {
        let frame = Frame {
            sequence_index: 2,
            total_frames: 3,
            command: Command::SignTransaction,
            payload: "Network ; September".to_string(),
        };
        let text = frame.to_string();
        assert_eq!(text, "p2of3;sign-transaction;Network ; September");
        assert_eq!(text.parse::<Frame>().unwrap(), frame);
    }

    #[test]
    fn frame_header_is_validated() {
        for bad in [
            "p0of3;sign-transaction;x",
            "p4of3;sign-transaction;x",
            "q1of3;sign-transaction;x",
            "p1of3;sign-transaction",
            "p1ofx;sign-transaction;x",
        ] {
            assert!(bad.parse::<Frame>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn oversized_part_count_is_rejected() {
        let header = format!("p1of{};sign-transaction;x", usize::MAX);
        assert!(matches!(header.parse::<Frame>(), Err(AppError::InvalidFrame(_))));
        let header = format!("p1of{};sign-transaction;x", MAX_FRAMES + 1);
        assert!(matches!(header.parse::<Frame>(), Err(AppError::InvalidFrame(_))));
        let header = format!("p{MAX_FRAMES}of{MAX_FRAMES};sign-transaction;x");
        assert!(header.parse::<Frame>().is_ok());

        // Frames built by hand skip the parser.
        let frame = Frame {
            sequence_index: 1,
            total_frames: usize::MAX,
            command: Command::SignTransaction,
            payload: "x".to_string(),
        };
        assert!(matches!(reassemble(vec![frame]), Err(AppError::InvalidFrame(_))));
    }

    #[test]
    fn reassemble_accepts_any_order_and_repeats() {
        let text = "abcdefghij";
        let mut frames = encode_frames(text, 3, Command::SignTransaction).unwrap();
        frames.reverse();
        frames.push(frames[1].clone());
        assert_eq!(reassemble(frames).unwrap(), text);
    }

    #[test]
    fn reassemble_reports_missing_parts() {
        let mut frames = encode_frames("abcdefghij", 3, Command::SignTransaction).unwrap();
        frames.remove(1);
        let err = reassemble(frames).unwrap_err();
        assert!(err.to_string().contains("[2]"), "{err}");
    }

    #[test]
    fn reassemble_rejects_inconsistent_frames() {
        let mut frames = encode_frames("abcdef", 3, Command::SignTransaction).unwrap();
        frames.push(Frame {
            payload: "zzz".to_string(),
            ..frames[0].clone()
        });
        assert!(reassemble(frames).is_err());

        let mut frames = encode_frames("abcdef", 3, Command::SignTransaction).unwrap();
        frames[1].total_frames = 5;
        assert!(reassemble(frames).is_err());

        assert!(matches!(reassemble(Vec::new()), Err(AppError::EmptyFrames)));
    }
}
