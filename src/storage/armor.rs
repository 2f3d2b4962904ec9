//! ASCII armor: labelled base64 blocks with `key: value` headers.
//!
//! ```text
//! -----BEGIN Tendermint Light Client-----
//! name: alice
//!
//! AbCdEf...
//! -----END Tendermint Light Client-----
//! ```

use crate::error::{KeysError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::collections::BTreeMap;

/// Armor headers, rendered in key order.
pub type Headers = BTreeMap<String, String>;

const BEGIN_PREFIX: &str = "-----BEGIN ";
const END_PREFIX: &str = "-----END ";
const DASHES: &str = "-----";
const LINE_WIDTH: usize = 64;

/// A decoded armor block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Armor {
    pub block_type: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

fn has_line_break(s: &str) -> bool {
    s.contains('\n') || s.contains('\r')
}

/// Render `body` as an armor block labelled `block_type`.
pub fn encode_armor(block_type: &str, headers: &Headers, body: &[u8]) -> Result<String> {
    if block_type.is_empty() || has_line_break(block_type) || block_type.contains(DASHES) {
        return Err(KeysError::MalformedArmorError(format!(
            "Invalid block type '{}'",
            block_type.escape_debug()
        )));
    }

    let mut out = format!("{}{}{}\n", BEGIN_PREFIX, block_type, DASHES);
    for (key, value) in headers {
        if key.is_empty() || key.contains(':') || has_line_break(key) {
            return Err(KeysError::MalformedArmorError(format!(
                "Invalid header key '{}'",
                key.escape_debug()
            )));
        }
        if has_line_break(value) {
            return Err(KeysError::MalformedArmorError(format!(
                "Header '{}' has a line break in its value",
                key
            )));
        }
        out.push_str(key);
        out.push_str(": ");
        out.push_str(value);
        out.push('\n');
    }
    out.push('\n');

    let encoded = STANDARD.encode(body);
    // base64 output is ASCII, so byte chunks are valid UTF-8
    for chunk in encoded.as_bytes().chunks(LINE_WIDTH) {
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push('\n');
    }

    out.push_str(END_PREFIX);
    out.push_str(block_type);
    out.push_str(DASHES);
    out.push('\n');
    Ok(out)
}

/// Parse an armor block of any label.
pub fn decode_armor(text: &str) -> Result<Armor> {
    let mut lines = text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .skip_while(|line| line.trim().is_empty());

    let first = lines
        .next()
        .ok_or_else(|| KeysError::MalformedArmorError("empty input".to_string()))?;
    let block_type = first
        .strip_prefix(BEGIN_PREFIX)
        .and_then(|rest| rest.strip_suffix(DASHES))
        .filter(|label| !label.is_empty())
        .ok_or_else(|| KeysError::MalformedArmorError("missing BEGIN line".to_string()))?
        .to_string();
    let end_line = format!("{}{}{}", END_PREFIX, block_type, DASHES);

    let mut headers = Headers::new();
    let mut body = String::new();
    let mut in_headers = true;
    let mut ended = false;

    for line in lines.by_ref() {
        if line.starts_with(END_PREFIX) {
            if line != end_line {
                return Err(KeysError::MalformedArmorError(format!(
                    "mismatched END line '{}'",
                    line
                )));
            }
            ended = true;
            break;
        }

        if in_headers {
            if line.trim().is_empty() {
                in_headers = false;
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                let key = key.trim();
                if key.is_empty() {
                    return Err(KeysError::MalformedArmorError(format!(
                        "bad header line '{}'",
                        line
                    )));
                }
                headers.insert(key.to_string(), value.trim().to_string());
                continue;
            }
            in_headers = false;
        }

        body.push_str(line.trim());
    }

    if !ended {
        return Err(KeysError::MalformedArmorError("missing END line".to_string()));
    }
    if lines.any(|line| !line.trim().is_empty()) {
        return Err(KeysError::MalformedArmorError(
            "trailing data after END line".to_string(),
        ));
    }

    let body = STANDARD
        .decode(body.as_bytes())
        .map_err(|e| KeysError::MalformedArmorError(format!("invalid base64 body: {}", e)))?;

    Ok(Armor {
        block_type,
        headers,
        body,
    })
}

/// Parse an armor block and require its label to be `expected`.
pub fn unarmor(text: &str, expected: &str) -> Result<Armor> {
    let armor = decode_armor(text)?;
    if armor.block_type != expected {
        return Err(KeysError::UnknownBlockTypeError {
            expected: expected.to_string(),
            found: armor.block_type,
        });
    }
    Ok(armor)
}
