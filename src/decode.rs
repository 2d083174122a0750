//! Turning token text into [`Token`] values.
//!
//! Signature verification is not done here. A decoder only parses what the
//! bearer presented so the caveats can be inspected.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use secrecy::SecretString;

use crate::error::DecodeError;
use crate::token::Token;

/// Accepted token prefixes. `fm2` is current; the `fm1` forms are older
/// permission (`r`) and authentication (`a`) tokens sharing the same body.
const PREFIXES: [&str; 3] = ["fm2", "fm1r", "fm1a"];

/// Prefix used when encoding.
const ENCODE_PREFIX: &str = "fm2";

/// Authorization schemes that may precede a token list.
const SCHEMES: [&str; 2] = ["FlyV1 ", "Bearer "];

/// Extension point for token formats.
pub trait TokenDecoder {
    fn decode(&self, raw: &str) -> Result<Token, DecodeError>;
}

/// Decoder for `<prefix>_<base64url(JSON)>` tokens.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvelopeDecoder;

impl TokenDecoder for EnvelopeDecoder {
    fn decode(&self, raw: &str) -> Result<Token, DecodeError> {
        let (prefix, payload) = raw.trim().split_once('_').ok_or(DecodeError::UnknownPrefix)?;
        if !PREFIXES.contains(&prefix) {
            return Err(DecodeError::UnknownPrefix);
        }

        let body = URL_SAFE_NO_PAD.decode(payload)?;
        serde_json::from_slice(&body).map_err(|e| DecodeError::Body(e.to_string()))
    }
}

/// Encode a token in the envelope format [`EnvelopeDecoder`] reads.
pub fn encode(token: &Token) -> Result<String, serde_json::Error> {
    let body = serde_json::to_vec(token)?;
    Ok(format!("{ENCODE_PREFIX}_{}", URL_SAFE_NO_PAD.encode(body)))
}

/// Split token input into individual tokens.
///
/// Each line may be a bare token, a comma-separated list, or a full
/// authorization header value (`FlyV1 tok1,tok2`). Blank entries are dropped.
pub fn split_tokens(input: &str) -> Vec<SecretString> {
    input
        .lines()
        .flat_map(|line| {
            let line = line.trim();
            let list = SCHEMES
                .iter()
                .find_map(|scheme| line.strip_prefix(scheme))
                .unwrap_or(line);
            list.split(',')
        })
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
        .map(|tok| SecretString::from(tok.to_owned()))
        .collect()
}
