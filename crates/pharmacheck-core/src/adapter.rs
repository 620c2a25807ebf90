//! Response adapter: raw JSON body → [`NormalizedResponse`]
//!
//! Pure and total. A missing or mistyped node never fails here; it produces
//! empty columns or `null` scalars and the expectation checks report it.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lookup;
use crate::response::{NormalizedResponse, Slot, SlotId};

/// How an endpoint's payload maps onto the three slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Extraction {
    /// Array node; up to three fields become parallel columns.
    ListColumns { node: String, fields: Vec<String> },
    /// Object node; three fields become scalars.
    ScalarTriple { node: String, fields: [String; 3] },
    /// Object node; two fields become scalars, tertiary stays unbound.
    ScalarPair { node: String, fields: [String; 2] },
    /// Array node kept whole in the primary slot.
    NestedList { node: String },
}

impl Extraction {
    #[must_use]
    pub fn node(&self) -> &str {
        match self {
            Self::ListColumns { node, .. }
            | Self::ScalarTriple { node, .. }
            | Self::ScalarPair { node, .. }
            | Self::NestedList { node } => node,
        }
    }

    /// Field names bound to slots, in slot order.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        match self {
            Self::ListColumns { fields, .. } => fields.as_slice(),
            Self::ScalarTriple { fields, .. } => fields.as_slice(),
            Self::ScalarPair { fields, .. } => fields.as_slice(),
            Self::NestedList { .. } => &[],
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ListColumns { .. } => "list_columns",
            Self::ScalarTriple { .. } => "scalar_triple",
            Self::ScalarPair { .. } => "scalar_pair",
            Self::NestedList { .. } => "nested_list",
        }
    }

    /// Whether a field name can be resolved against responses of this shape.
    #[must_use]
    pub fn resolves(&self, field: &str) -> bool {
        matches!(self, Self::NestedList { .. }) || self.fields().iter().any(|f| f == field)
    }

    /// Extract the three slots from a body. Never mutates the body.
    #[must_use]
    pub fn extract(&self, body: &Value) -> [Slot; 3] {
        let mut slots: [Slot; 3] = Default::default();
        match self {
            Self::ListColumns { node, fields } => {
                let items = lookup::array(body, node).unwrap_or_default();
                for (slot, field) in slots.iter_mut().zip(fields) {
                    *slot = Slot::Column(
                        items
                            .iter()
                            .map(|item| item.get(field).cloned().unwrap_or(Value::Null))
                            .collect(),
                    );
                }
            }
            Self::ScalarTriple { node, .. } | Self::ScalarPair { node, .. } => {
                let object = lookup::node(body, node);
                for (slot, field) in slots.iter_mut().zip(self.fields()) {
                    *slot = Slot::Scalar(
                        object
                            .and_then(|o| o.get(field))
                            .cloned()
                            .unwrap_or(Value::Null),
                    );
                }
            }
            Self::NestedList { node } => {
                slots[0] = Slot::Records(lookup::array(body, node).unwrap_or_default().to_vec());
            }
        }
        slots
    }
}

/// Normalize a parsed body and its HTTP status through an extraction strategy.
#[must_use]
pub fn adapt(body: Value, status_code: u16, extraction: &Extraction) -> NormalizedResponse {
    let slots = extraction.extract(&body);
    let fields = extraction.fields();
    let mut response = NormalizedResponse::new(status_code, body).with_node(extraction.node());
    for (id, slot) in SlotId::ALL.into_iter().zip(slots) {
        let field = fields.get(id.index()).map(String::as_str);
        response = response.with_slot(id, field, slot);
    }
    response
}
