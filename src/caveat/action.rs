use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Operations a caveat permits on the resource it scopes.
    ///
    /// Only these five bits are representable; decoding a mask with any
    /// other bit set fails.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ActionMask: u16 {
        const READ    = 0b0000_0001;
        const WRITE   = 0b0000_0010;
        const CREATE  = 0b0000_0100;
        const DELETE  = 0b0000_1000;
        const CONTROL = 0b0001_0000;
    }
}

/// Rendering order for labels. Decoupled from the bit values above.
const CANONICAL_ORDER: [(ActionMask, &str); 5] = [
    (ActionMask::READ, "read"),
    (ActionMask::WRITE, "write"),
    (ActionMask::CREATE, "create"),
    (ActionMask::DELETE, "delete"),
    (ActionMask::CONTROL, "control"),
];

impl ActionMask {
    /// Human-readable label for the mask.
    ///
    /// The full set reads `everything`, bare read access reads `read-only`,
    /// anything else lists the set actions in canonical order joined by `", "`.
    /// The empty mask yields an empty string. Bits outside the five actions
    /// are ignored.
    pub fn label(self) -> String {
        let mask = self & Self::all();

        if mask == Self::all() {
            return "everything".to_owned();
        }

        if mask == Self::READ {
            return "read-only".to_owned();
        }

        CANONICAL_ORDER
            .iter()
            .filter(|(bit, _)| mask.contains(*bit))
            .map(|(_, name)| *name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Serialize for ActionMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16((*self & Self::all()).bits())
    }
}

impl<'de> Deserialize<'de> for ActionMask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u16::deserialize(deserializer)?;
        Self::from_bits(bits).ok_or_else(|| {
            serde::de::Error::custom(format!("action mask {bits:#x} sets unknown bits"))
        })
    }
}
