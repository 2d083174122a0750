//! Text report of a token's caveat chain.
//!
//! Each caveat is described on its own. The report never tries to work out
//! the token's combined permissions.

use std::fmt::Display;

use tracing::debug;

use crate::caveat::{ActionMask, Caveat, LOCATION_AUTHENTICATION};
use crate::resolver::{IdKind, IdResolver};
use crate::token::Token;

/// Accumulates report lines, one tab of indentation per depth level.
#[derive(Debug, Default)]
struct IndentWriter {
    buf: String,
}

impl IndentWriter {
    fn line(&mut self, depth: usize, text: impl Display) {
        for _ in 0..depth {
            self.buf.push('\t');
        }
        self.buf.push_str(&text.to_string());
        self.buf.push('\n');
    }

    fn finish(self) -> String {
        self.buf
    }
}

/// Fixed sentence for discharge locations with a known meaning.
fn discharge_description(location: &str) -> Option<&'static str> {
    match location {
        LOCATION_AUTHENTICATION => Some("* Requires authentication to Fly.io"),
        _ => None,
    }
}

/// Label for an action mask. See [`ActionMask::label`].
pub fn label(mask: ActionMask) -> String {
    mask.label()
}

/// Render one token as a header followed by one block per caveat.
pub fn render_token(token: &Token, resolver: &IdResolver) -> String {
    let mut out = IndentWriter::default();

    out.line(
        0,
        format_args!(
            "Token ...{} (from {})",
            hex::encode(token.short_key_id()),
            token.location()
        ),
    );
    out.line(0, "Caveats in this token:");

    for caveat in token.caveats() {
        render_caveat(&mut out, 1, caveat, resolver);
    }

    out.finish()
}

fn render_caveat(out: &mut IndentWriter, depth: usize, caveat: &Caveat, resolver: &IdResolver) {
    match caveat {
        Caveat::OrganizationScope { org_id, mask } => {
            out.line(
                depth,
                format_args!(
                    "* Exclusively for organization '{}'",
                    resolver.resolve(*org_id, IdKind::Organization)
                ),
            );
            out.line(depth + 1, format_args!("Allowed actions: {}", mask.label()));
        }
        Caveat::AppScope { resources } => {
            out.line(depth, "* Exclusive for the following apps:");
            for (app_id, mask) in resources {
                out.line(
                    depth + 1,
                    format_args!(
                        "For app '{}', allowed actions: {}",
                        resolver.resolve(*app_id, IdKind::App),
                        mask.label()
                    ),
                );
            }
        }
        Caveat::ThirdPartyDischarge { location } => match discharge_description(location) {
            Some(description) => out.line(depth, description),
            // TODO: decide whether unrecognized discharge locations should get a generic line.
            None => debug!("skipping discharge caveat with unrecognized location"),
        },
        Caveat::Unknown { tag, fields } => {
            out.line(depth, format_args!("cav: {tag} {fields}"));
        }
    }
}
