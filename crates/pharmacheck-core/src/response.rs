//! Normalized response record
//!
//! Every endpoint payload, whatever its shape, is reduced to a status code,
//! a status text, three positional slots, and the raw body. Each slot also
//! remembers the field name it was extracted from, so checks address values
//! by name (`"ItemId"`) rather than by position.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lookup;

static NULL: Value = Value::Null;

/// Positional slot identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SlotId {
    Primary,
    Secondary,
    Tertiary,
}

impl SlotId {
    pub const ALL: [Self; 3] = [Self::Primary, Self::Secondary, Self::Tertiary];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Secondary => 1,
            Self::Tertiary => 2,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Tertiary => "tertiary",
        }
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content of one slot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Slot {
    /// Not populated by the extraction strategy
    #[default]
    Unbound,
    /// A single extracted value (JSON `null` when the field was absent)
    Scalar(Value),
    /// One value per source record, in source order
    Column(Vec<Value>),
    /// Source records kept whole
    Records(Vec<Value>),
}

impl Slot {
    /// Number of entries for sequence slots, `None` for scalars and unbound slots.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Column(values) | Self::Records(values) => Some(values.len()),
            Self::Unbound | Self::Scalar(_) => None,
        }
    }

    #[must_use]
    pub fn is_sequence(&self) -> bool {
        self.len().is_some()
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        !matches!(self, Self::Unbound)
    }

    #[must_use]
    pub fn as_column(&self) -> Option<&[Value]> {
        match self {
            Self::Column(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }
}

/// Values a field name resolves to inside a [`NormalizedResponse`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValues<'a> {
    Scalar(&'a Value),
    Sequence(Vec<&'a Value>),
}

impl FieldValues<'_> {
    /// All values as a flat list (a scalar becomes a one-element list).
    #[must_use]
    pub fn values(&self) -> Vec<&Value> {
        match self {
            Self::Scalar(v) => vec![*v],
            Self::Sequence(vs) => vs.clone(),
        }
    }
}

/// Fixed-shape view of one HTTP response.
///
/// Constructed once per call and immutable afterwards: the builder methods
/// consume `self`, and no accessor hands out mutable references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedResponse {
    status_code: u16,
    status: Option<String>,
    node: String,
    slots: [Slot; 3],
    bindings: [Option<String>; 3],
    raw_body: Value,
}

impl NormalizedResponse {
    /// Start from the raw parts; `status` is read from the top-level `Status` field.
    #[must_use]
    pub fn new(status_code: u16, raw_body: Value) -> Self {
        Self {
            status_code,
            status: lookup::status_text(&raw_body),
            node: String::new(),
            slots: Default::default(),
            bindings: Default::default(),
            raw_body,
        }
    }

    /// Record the node path the slots were extracted from.
    #[must_use]
    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = node.into();
        self
    }

    /// Populate one slot, optionally naming the field it holds.
    #[must_use]
    pub fn with_slot(mut self, id: SlotId, field: Option<&str>, slot: Slot) -> Self {
        self.slots[id.index()] = slot;
        self.bindings[id.index()] = field.map(str::to_string);
        self
    }

    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.status_code
    }

    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Node path (dot-separated) the slots were extracted from.
    #[must_use]
    pub fn node(&self) -> &str {
        &self.node
    }

    #[must_use]
    pub fn raw_body(&self) -> &Value {
        &self.raw_body
    }

    #[must_use]
    pub fn slot(&self, id: SlotId) -> &Slot {
        &self.slots[id.index()]
    }

    #[must_use]
    pub fn primary(&self) -> &Slot {
        self.slot(SlotId::Primary)
    }

    #[must_use]
    pub fn secondary(&self) -> &Slot {
        self.slot(SlotId::Secondary)
    }

    #[must_use]
    pub fn tertiary(&self) -> &Slot {
        self.slot(SlotId::Tertiary)
    }

    /// Field name bound to a slot, if any.
    #[must_use]
    pub fn binding(&self, id: SlotId) -> Option<&str> {
        self.bindings[id.index()].as_deref()
    }

    /// Slot holding the named field.
    #[must_use]
    pub fn slot_of(&self, field: &str) -> Option<SlotId> {
        SlotId::ALL
            .into_iter()
            .find(|id| self.binding(*id) == Some(field))
    }

    /// Resolve a field name to its extracted values.
    ///
    /// Bound slots take precedence; otherwise a `Records` slot is searched and
    /// the key is read from every record (absent keys read as `null`).
    #[must_use]
    pub fn field(&self, name: &str) -> Option<FieldValues<'_>> {
        if let Some(id) = self.slot_of(name) {
            return match self.slot(id) {
                Slot::Unbound => None,
                Slot::Scalar(v) => Some(FieldValues::Scalar(v)),
                Slot::Column(vs) => Some(FieldValues::Sequence(vs.iter().collect())),
                Slot::Records(rs) => Some(FieldValues::Sequence(
                    rs.iter().map(|r| r.get(name).unwrap_or(&NULL)).collect(),
                )),
            };
        }
        self.slots.iter().find_map(|slot| match slot {
            Slot::Records(rs) => Some(FieldValues::Sequence(
                rs.iter().map(|r| r.get(name).unwrap_or(&NULL)).collect(),
            )),
            _ => None,
        })
    }
}
