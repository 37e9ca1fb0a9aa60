//! Slot-type registry and entity resolution.
//!
//! Custom types are authoritative: a raw value must hit a canonical value or
//! synonym. Recognized builtins that are not fully enumerated accept anything
//! as free text. Overlapping synonyms across distinct canonical values are
//! legal, so a lookup returns every hit, not just the first.

use std::collections::HashMap;

use regex::Regex;
use serde_json::{json, Value};

use super::builtin;
use super::schema::SlotTypeSchema;
use crate::error::{HarnessError, Result};

#[derive(Debug, Clone)]
pub struct SlotTypeValue {
    pub id: Option<String>,
    pub value: String,
    pub synonyms: Vec<String>,
    pub builtin: bool,
}

impl SlotTypeValue {
    /// Entity id reported in resolution records. Falls back to the canonical
    /// value when the model declares no explicit id.
    pub fn entity_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.value)
    }

    fn accepts(&self, needle: &str) -> bool {
        self.value.eq_ignore_ascii_case(needle)
            || self.synonyms.iter().any(|s| s.eq_ignore_ascii_case(needle))
    }
}

#[derive(Debug, Clone)]
pub struct SlotType {
    pub name: String,
    pub values: Vec<SlotTypeValue>,
    pub pattern: Option<Regex>,
}

impl SlotType {
    fn from_schema(schema: &SlotTypeSchema) -> Self {
        let values = schema
            .values
            .iter()
            .map(|v| SlotTypeValue {
                id: v.id.clone(),
                value: v.name.value.clone(),
                synonyms: v.name.synonyms.clone(),
                builtin: v.builtin,
            })
            .collect();
        SlotType {
            name: schema.name.clone(),
            values,
            pattern: None,
        }
    }

    /// The builtin number type: digit pattern plus the spoken-word table.
    fn number() -> Self {
        let values = builtin::NUMBER_WORDS
            .iter()
            .map(|w| SlotTypeValue {
                id: None,
                value: (*w).to_string(),
                synonyms: Vec::new(),
                builtin: true,
            })
            .collect();
        SlotType {
            name: builtin::NUMBER_TYPE.to_string(),
            values,
            // The pattern is a compile-time constant.
            pattern: Some(Regex::new(builtin::NUMBER_PATTERN).unwrap()),
        }
    }

    pub fn is_builtin(&self) -> bool {
        builtin::is_builtin_slot_type(&self.name)
    }

    /// Whether a failed lookup is final. Custom types are always
    /// authoritative, as are pattern builtins and builtins the platform
    /// enumerates in full (like AMAZON.NUMBER). A builtin merely extended
    /// with custom values keeps its open base set.
    pub fn is_authoritative(&self) -> bool {
        !self.is_builtin()
            || self.pattern.is_some()
            || (!self.values.is_empty() && self.values.iter().all(|v| v.builtin))
    }

    /// True when the model extends this type with its own values. Only such
    /// types produce entity-resolution records on the wire.
    pub fn has_custom_values(&self) -> bool {
        self.values.iter().any(|v| !v.builtin)
    }

    /// All value entries hit by `raw`, in declaration order.
    pub fn lookup(&self, raw: &str) -> Vec<&SlotTypeValue> {
        self.values.iter().filter(|v| v.accepts(raw)).collect()
    }
}

/// Outcome of resolving a raw utterance capture against a slot's type.
#[derive(Debug, Clone)]
pub struct SlotMatch {
    pub matched: bool,
    /// Accepted as free text rather than validated against real values.
    pub untyped: bool,
    pub value: String,
    /// `(entity id, canonical value)` per hit; empty for untyped matches.
    pub entities: Vec<(String, String)>,
}

impl SlotMatch {
    fn untyped(value: &str) -> Self {
        SlotMatch {
            matched: true,
            untyped: true,
            value: value.to_string(),
            entities: Vec::new(),
        }
    }

    fn rejected(value: &str) -> Self {
        SlotMatch {
            matched: false,
            untyped: false,
            value: value.to_string(),
            entities: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SlotTypeRegistry {
    // Keyed by lowercased type name.
    types: HashMap<String, SlotType>,
}

impl SlotTypeRegistry {
    pub fn build(schemas: &[SlotTypeSchema]) -> Result<Self> {
        let mut types = HashMap::new();
        types.insert(builtin::NUMBER_TYPE.to_lowercase(), SlotType::number());
        for schema in schemas {
            if schema.name.trim().is_empty() {
                return Err(HarnessError::Model(
                    "slot type with empty name".to_string(),
                ));
            }
            let slot_type = SlotType::from_schema(schema);
            types.insert(schema.name.to_lowercase(), slot_type);
        }
        Ok(SlotTypeRegistry { types })
    }

    pub fn get(&self, name: &str) -> Option<&SlotType> {
        self.types.get(&name.to_lowercase())
    }

    /// Resolve a raw value against a (possibly absent) slot type.
    pub fn resolve(&self, type_name: Option<&str>, raw: &str) -> SlotMatch {
        let trimmed = raw.trim();
        let slot_type = match type_name.and_then(|n| self.get(n)) {
            Some(t) => t,
            // Undeclared or unregistered type: free text always matches.
            None => return SlotMatch::untyped(trimmed),
        };

        if let Some(pattern) = &slot_type.pattern {
            if pattern.is_match(trimmed) {
                return SlotMatch {
                    matched: true,
                    untyped: false,
                    value: trimmed.to_string(),
                    entities: Vec::new(),
                };
            }
        }

        let hits = slot_type.lookup(trimmed);
        if !hits.is_empty() {
            let entities = hits
                .iter()
                .filter(|v| !v.builtin)
                .map(|v| (v.entity_id().to_string(), v.value.clone()))
                .collect();
            return SlotMatch {
                matched: true,
                untyped: false,
                value: trimmed.to_string(),
                entities,
            };
        }

        // Builtins with an open value set accept anything as free text.
        if !slot_type.is_authoritative() {
            return SlotMatch::untyped(trimmed);
        }
        SlotMatch::rejected(trimmed)
    }

    /// Entity-resolution block for a slot assignment, or `None` when the type
    /// carries no custom values (pure builtins never produce records).
    pub fn resolutions_per_authority(
        &self,
        type_name: Option<&str>,
        slot_match: &SlotMatch,
        application_id: &str,
    ) -> Option<Value> {
        let slot_type = type_name.and_then(|n| self.get(n))?;
        if !slot_type.has_custom_values() {
            return None;
        }
        let authority = format!(
            "amzn1.er-authority.echo-sdk.{}.{}",
            application_id, slot_type.name
        );
        let code = if slot_match.entities.is_empty() {
            "ER_SUCCESS_NO_MATCH"
        } else {
            "ER_SUCCESS_MATCH"
        };
        let values: Vec<Value> = slot_match
            .entities
            .iter()
            .map(|(id, name)| json!({ "value": { "id": id, "name": name } }))
            .collect();
        Some(json!([{
            "authority": authority,
            "status": { "code": code },
            "values": values,
        }]))
    }
}
