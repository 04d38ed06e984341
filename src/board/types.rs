use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identifier of a token (player id as rendered by the server)
pub type TokenId = String;

/// Identifier of a slot, e.g. "L1LW" or "G2"
pub type SlotId = String;

/// Capability of a token and the matching accept tag of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CapabilityTag {
    F,
    D,
    G,
}

impl CapabilityTag {
    pub const ALL: [CapabilityTag; 3] = [CapabilityTag::F, CapabilityTag::D, CapabilityTag::G];

    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityTag::F => "F",
            CapabilityTag::D => "D",
            CapabilityTag::G => "G",
        }
    }

    /// Placeholder shown inside an empty slot accepting this tag
    pub fn placeholder(&self) -> &'static str {
        match self {
            CapabilityTag::F => "Drag a forward…",
            CapabilityTag::D => "Drag a defenseman…",
            CapabilityTag::G => "Drag a goalie…",
        }
    }
}

impl fmt::Display for CapabilityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown capability tag: {0}")]
pub struct UnknownTag(pub String);

impl FromStr for CapabilityTag {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "f" | "forward" | "fw" => Ok(CapabilityTag::F),
            "d" | "defense" | "defence" | "defenseman" => Ok(CapabilityTag::D),
            "g" | "goalie" | "goalkeeper" => Ok(CapabilityTag::G),
            _ => Err(UnknownTag(s.trim().to_string())),
        }
    }
}

/// An assignable entity (a player)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub display_name: String,
    pub capability_tag: CapabilityTag,
}

impl Token {
    pub fn new(id: impl Into<TokenId>, display_name: impl Into<String>, capability_tag: CapabilityTag) -> Self {
        Token {
            id: id.into(),
            display_name: display_name.into(),
            capability_tag,
        }
    }
}

/// A fixed assignment target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    pub accept_tag: CapabilityTag,
    pub group: Option<String>, // line number, None for goalie slots
}

impl Slot {
    pub fn new(id: impl Into<SlotId>, accept_tag: CapabilityTag, group: Option<&str>) -> Self {
        Slot {
            id: id.into(),
            accept_tag,
            group: group.map(str::to_string),
        }
    }

    /// Label used for the pool badge of a token sitting in this slot
    pub fn badge(&self) -> String {
        self.group.clone().unwrap_or_else(|| self.id.clone())
    }
}

/// Where a placement gesture started
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "slot", rename_all = "snake_case")]
pub enum Origin {
    Pool,
    Slot(SlotId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignError {
    #[error("token {token} cannot be placed into slot {slot}")]
    CapabilityMismatch { token: TokenId, slot: SlotId },

    #[error("unknown token: {0}")]
    UnknownToken(TokenId),

    #[error("unknown slot: {0}")]
    UnknownSlot(SlotId),

    #[error("no token selected")]
    NoSelection,
}
