//! Restriction expressions attached to action slots.
//!
//! An expression has the shape `<type>:<value>` where `<type>` is an ASCII
//! alphanumeric word. Parsing distinguishes three outcomes that evaluate very
//! differently:
//!
//! - the string does not have that shape at all: [`Restriction::parse`] returns
//!   `None` and the slot is treated as unrestricted
//! - the shape is right but the type is not one we know: [`Restriction::Unknown`],
//!   which always denies
//! - a recognised type: [`Restriction::Team`], [`Restriction::Players`] or
//!   [`Restriction::Rank`] (with [`Restriction::MalformedRank`] for bad numbers)
use std::str::FromStr;

use strum::{EnumString, IntoStaticStr};

/// Recognised restriction types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum RestrictionKind {
    Team,
    Player,
    Rank,
}

/// A parsed restriction expression borrowing from its source string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Restriction<'a> {
    /// `team:<name>`: the actor's team must equal `<name>` exactly.
    Team(&'a str),
    /// `player:<csv>`: the actor's identity must appear in the list.
    Players(&'a str),
    /// `rank:<group>:<min>`: the actor's rank in `group_id` must reach `min_rank`.
    Rank { group_id: u64, min_rank: u64 },
    /// `rank:` with a value that is not two non-negative integers.
    MalformedRank(&'a str),
    /// Well-formed expression of a type we do not recognise.
    Unknown(&'a str),
}

impl<'a> Restriction<'a> {
    /// Parses `expr`, returning `None` when it is not a `<type>:<value>` pair.
    pub fn parse(expr: &'a str) -> Option<Self> {
        let (kind, value) = expr.split_once(':')?;
        if kind.is_empty() || value.is_empty() || !kind.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return None;
        }

        let restriction = match RestrictionKind::from_str(kind) {
            Ok(RestrictionKind::Team) => Restriction::Team(value),
            Ok(RestrictionKind::Player) => Restriction::Players(value),
            Ok(RestrictionKind::Rank) => parse_rank(value),
            Err(_) => Restriction::Unknown(kind),
        };
        Some(restriction)
    }

    /// Returns true if `identity` appears in a `player:` allow-list.
    ///
    /// Both the identity and every comma-separated entry are whitespace-trimmed
    /// before the exact comparison. Always false for other restriction types.
    pub fn lists_player(&self, identity: &str) -> bool {
        let Restriction::Players(csv) = self else {
            return false;
        };
        let identity = identity.trim();
        csv.split(',').any(|entry| entry.trim() == identity)
    }
}

fn parse_rank(value: &str) -> Restriction<'_> {
    let parsed = value
        .split_once(':')
        .and_then(|(group, min)| Some((parse_unsigned(group)?, parse_unsigned(min)?)));

    match parsed {
        Some((group_id, min_rank)) => Restriction::Rank { group_id, min_rank },
        None => Restriction::MalformedRank(value),
    }
}

/// Digits only: rejects signs, whitespace and anything `u64::from_str` would
/// otherwise be lenient about.
fn parse_unsigned(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
