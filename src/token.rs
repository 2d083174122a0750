use serde::{Deserialize, Serialize};

use crate::caveat::Caveat;

/// Trailing key-id bytes shown in report headers.
const SHORT_KEY_ID_LEN: usize = 6;

/// A decoded capability token: where it came from, which key minted it, and
/// its caveat chain in attenuation order.
///
/// The chain is read-only once decoded. Diagnostic code may [`append`](Token::append)
/// synthetic caveats; nothing else can reach the underlying vector:
///
/// ```compile_fail
/// use tokenlens::caveat::Caveat;
/// use tokenlens::token::Token;
///
/// let mut token = Token::new("https://api.fly.io/v1", b"kid".to_vec(), Vec::new());
/// token.caveats.push(Caveat::ThirdPartyDischarge { location: String::new() });
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    location: String,
    #[serde(rename = "kid", with = "hex::serde")]
    key_id: Vec<u8>,
    #[serde(default)]
    caveats: Vec<Caveat>,
}

impl Token {
    pub fn new(location: impl Into<String>, key_id: Vec<u8>, caveats: Vec<Caveat>) -> Self {
        Self {
            location: location.into(),
            key_id,
            caveats,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn key_id(&self) -> &[u8] {
        &self.key_id
    }

    /// Last six bytes of the key id, or the whole id when it is shorter.
    /// Only meant to tell tokens apart in a report.
    pub fn short_key_id(&self) -> &[u8] {
        let start = self.key_id.len().saturating_sub(SHORT_KEY_ID_LEN);
        &self.key_id[start..]
    }

    pub fn caveats(&self) -> &[Caveat] {
        &self.caveats
    }

    /// Add a caveat to the end of the chain. Diagnostic paths only; decoded
    /// tokens are never extended in production flows.
    pub fn append(&mut self, caveat: Caveat) {
        self.caveats.push(caveat);
    }
}
