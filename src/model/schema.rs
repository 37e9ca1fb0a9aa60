//! Serde mirror of the interaction-model JSON file.
//!
//! The canonical shape is the skill-builder document
//! (`{interactionModel: {languageModel, dialog?, prompts?}}`); a legacy flat
//! shape carrying `intents`/`types` at the top level is also accepted.

use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ModelFile {
    #[serde(rename = "interactionModel")]
    pub interaction_model: Option<InteractionModelDoc>,
    // Legacy flat shape.
    #[serde(default)]
    pub intents: Vec<IntentSchema>,
    #[serde(default)]
    pub types: Vec<SlotTypeSchema>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionModelDoc {
    #[serde(rename = "languageModel")]
    pub language_model: LanguageModel,
    pub dialog: Option<DialogDoc>,
    #[serde(default)]
    pub prompts: Vec<PromptSchema>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LanguageModel {
    #[serde(rename = "invocationName", default)]
    pub invocation_name: Option<String>,
    #[serde(default)]
    pub intents: Vec<IntentSchema>,
    #[serde(default)]
    pub types: Vec<SlotTypeSchema>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntentSchema {
    pub name: String,
    #[serde(default)]
    pub slots: Vec<SlotSchema>,
    #[serde(default)]
    pub samples: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotSchema {
    pub name: String,
    #[serde(rename = "type", default)]
    pub slot_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotTypeSchema {
    pub name: String,
    #[serde(default)]
    pub values: Vec<SlotTypeValueSchema>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotTypeValueSchema {
    #[serde(default)]
    pub id: Option<String>,
    pub name: SlotValueName,
    #[serde(default)]
    pub builtin: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotValueName {
    pub value: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DialogDoc {
    #[serde(default)]
    pub intents: Vec<DialogIntentSchema>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DialogIntentSchema {
    pub name: String,
    #[serde(rename = "confirmationRequired", default)]
    pub confirmation_required: bool,
    #[serde(default)]
    pub prompts: HashMap<String, String>,
    #[serde(default)]
    pub slots: Vec<DialogSlotSchema>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DialogSlotSchema {
    pub name: String,
    #[serde(rename = "type", default)]
    pub slot_type: Option<String>,
    #[serde(rename = "confirmationRequired", default)]
    pub confirmation_required: bool,
    #[serde(rename = "elicitationRequired", default)]
    pub elicitation_required: bool,
    #[serde(default)]
    pub prompts: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptSchema {
    pub id: String,
    #[serde(default)]
    pub variations: Vec<PromptVariation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptVariation {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}
