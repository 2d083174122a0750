//! The token-debugging pipeline: decode every input, build the name tables
//! once, then render each decoded token in input order.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use crate::caveat::sample_caveats;
use crate::decode::TokenDecoder;
use crate::error::{DecodeError, TokenLensError};
use crate::render::render_token;
use crate::resolver::{ApplicationListing, IdResolver};
use crate::token::Token;

#[derive(Debug, Default, Clone, Copy)]
pub struct DebugOptions {
    /// Also produce a JSON array of every decoded token.
    pub verbose: bool,
    /// Append [`sample_caveats`] to each token before rendering.
    pub sample_caveats: bool,
}

/// An input that could not be decoded, with its zero-based position.
#[derive(Debug)]
pub struct DecodeFailure {
    pub position: usize,
    pub error: DecodeError,
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unable to decode token at position {}: {}",
            self.position, self.error
        )
    }
}

#[derive(Debug)]
pub struct DebugReport {
    /// One rendered block per decoded token, in input order.
    pub blocks: Vec<String>,
    pub failures: Vec<DecodeFailure>,
    /// Pretty JSON of all decoded tokens, when requested.
    pub json: Option<String>,
}

/// Run the pipeline over `inputs`.
///
/// Each decode failure is passed to `on_failure` as it happens and the batch
/// continues. A listing failure aborts before anything is rendered.
pub fn run<D, L>(
    inputs: &[SecretString],
    decoder: &D,
    listing: &L,
    options: DebugOptions,
    mut on_failure: impl FnMut(&DecodeFailure),
) -> Result<DebugReport, TokenLensError>
where
    D: TokenDecoder + ?Sized,
    L: ApplicationListing + ?Sized,
{
    let mut tokens: Vec<Token> = Vec::with_capacity(inputs.len());
    let mut failures = Vec::new();

    for (position, raw) in inputs.iter().enumerate() {
        match decoder.decode(raw.expose_secret()) {
            Ok(token) => tokens.push(token),
            Err(error) => {
                warn!(position, %error, "token decode failed");
                let failure = DecodeFailure { position, error };
                on_failure(&failure);
                failures.push(failure);
            }
        }
    }

    let resolver = IdResolver::build(listing)?;

    if options.sample_caveats {
        for token in &mut tokens {
            for caveat in sample_caveats() {
                token.append(caveat);
            }
        }
    }

    let blocks: Vec<String> = tokens
        .iter()
        .map(|token| render_token(token, &resolver))
        .collect();

    // Encode the whole array before handing it out so a failure never
    // leaves partial output behind.
    let json = if options.verbose {
        Some(serde_json::to_string_pretty(&tokens)?)
    } else {
        None
    };

    info!(
        rendered = blocks.len(),
        failed = failures.len(),
        "tokens processed"
    );

    Ok(DebugReport {
        blocks,
        failures,
        json,
    })
}
