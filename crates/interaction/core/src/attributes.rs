//! Typed view over an entity's dynamically keyed metadata.
//!
//! Worlds attach free-form attributes to entities. The gatekeeper only cares
//! about a handful of keys, so [`AttributeSnapshot`] parses those once into
//! named fields while keeping the full map for anything else a handler wants.
//!
//! Recognised keys:
//! - `ActionText`, `ObjectText`: presence marks an interaction root
//! - `Action1..Action20`: ordered action names; the first gap ends the list
//! - `Action{i}_Restrict`: optional restriction expression for slot `i`
use std::collections::HashMap;
use std::fmt;

use arrayvec::ArrayVec;

use crate::config::GatekeeperConfig;

/// Raw attribute bag as reported by the world.
pub type AttributeMap = HashMap<String, AttributeValue>;

pub const ACTION_TEXT_KEY: &str = "ActionText";
pub const OBJECT_TEXT_KEY: &str = "ObjectText";

const SLOT_KEYS: [(&str, &str); GatekeeperConfig::MAX_ACTION_SLOTS] = [
    ("Action1", "Action1_Restrict"),
    ("Action2", "Action2_Restrict"),
    ("Action3", "Action3_Restrict"),
    ("Action4", "Action4_Restrict"),
    ("Action5", "Action5_Restrict"),
    ("Action6", "Action6_Restrict"),
    ("Action7", "Action7_Restrict"),
    ("Action8", "Action8_Restrict"),
    ("Action9", "Action9_Restrict"),
    ("Action10", "Action10_Restrict"),
    ("Action11", "Action11_Restrict"),
    ("Action12", "Action12_Restrict"),
    ("Action13", "Action13_Restrict"),
    ("Action14", "Action14_Restrict"),
    ("Action15", "Action15_Restrict"),
    ("Action16", "Action16_Restrict"),
    ("Action17", "Action17_Restrict"),
    ("Action18", "Action18_Restrict"),
    ("Action19", "Action19_Restrict"),
    ("Action20", "Action20_Restrict"),
];

/// A single attribute value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

/// One `ActionN` entry together with its paired restriction.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionSlot {
    /// 1-based slot number (`N` in `ActionN`).
    pub index: usize,
    pub name: String,
    pub restrict: Option<String>,
}

/// Parsed attribute snapshot of one entity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeSnapshot {
    action_text: Option<String>,
    object_text: Option<String>,
    has_first_slot: bool,
    slots: ArrayVec<ActionSlot, { GatekeeperConfig::MAX_ACTION_SLOTS }>,
    raw: AttributeMap,
}

impl AttributeSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses the recognised keys out of `raw`.
    ///
    /// A missing or non-string `ActionN` ends the slot list.
    pub fn from_map(raw: AttributeMap) -> Self {
        let mut slots = ArrayVec::new();
        for (offset, (action_key, restrict_key)) in SLOT_KEYS.iter().enumerate() {
            let Some(name) = raw.get(*action_key).and_then(AttributeValue::as_str) else {
                break;
            };
            let restrict = raw
                .get(*restrict_key)
                .and_then(AttributeValue::as_str)
                .map(str::to_string);
            slots.push(ActionSlot {
                index: offset + 1,
                name: name.to_string(),
                restrict,
            });
        }

        Self {
            action_text: raw.get(ACTION_TEXT_KEY).map(ToString::to_string),
            object_text: raw.get(OBJECT_TEXT_KEY).map(ToString::to_string),
            has_first_slot: raw.contains_key(SLOT_KEYS[0].0),
            slots,
            raw,
        }
    }

    /// True when the entity declares interaction metadata of its own.
    pub fn is_interaction_root(&self) -> bool {
        self.action_text.is_some() || self.object_text.is_some() || self.has_first_slot
    }

    pub fn slots(&self) -> &[ActionSlot] {
        &self.slots
    }

    /// Declared action names in slot order.
    pub fn actions(&self) -> impl Iterator<Item = &str> + '_ {
        self.slots.iter().map(|slot| slot.name.as_str())
    }

    /// First slot whose name matches `action` exactly.
    pub fn slot_for(&self, action: &str) -> Option<&ActionSlot> {
        self.slots.iter().find(|slot| slot.name == action)
    }

    pub fn declares(&self, action: &str) -> bool {
        self.slot_for(action).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.raw.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}
