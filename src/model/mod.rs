//! Interaction-model aggregate: intents, slot types, compiled sample
//! phrases, dialog metadata, and prompts, built once from the model JSON and
//! immutable afterwards.

pub mod builtin;
pub mod matcher;
pub mod phrase;
pub mod schema;
pub mod slots;

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::error::{HarnessError, Result};
use matcher::UtteranceMatch;
use phrase::SamplePhrase;
use schema::ModelFile;
use slots::SlotTypeRegistry;

#[derive(Debug, Clone)]
pub struct IntentSlot {
    pub name: String,
    pub slot_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Intent {
    pub name: String,
    pub slots: Vec<IntentSlot>,
}

impl Intent {
    pub fn has_slot(&self, name: &str) -> bool {
        self.slots.iter().any(|s| s.name == name)
    }

    pub fn slot_type_of(&self, name: &str) -> Option<&str> {
        self.slots
            .iter()
            .find(|s| s.name == name)
            .and_then(|s| s.slot_type.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct DialogSlot {
    pub name: String,
    pub slot_type: Option<String>,
    pub elicitation_required: bool,
    pub confirmation_required: bool,
    pub prompts: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct DialogIntent {
    pub name: String,
    pub confirmation_required: bool,
    pub prompts: HashMap<String, String>,
    pub slots: Vec<DialogSlot>,
}

#[derive(Debug, Clone)]
pub struct Prompt {
    pub id: String,
    pub variations: Vec<String>,
}

impl Prompt {
    /// First variation with `{slotName}` placeholders replaced by the
    /// supplied slot values.
    pub fn render(&self, slot_values: &HashMap<String, String>) -> String {
        let Some(text) = self.variations.first() else {
            return String::new();
        };
        let mut rendered = text.clone();
        for (name, value) in slot_values {
            rendered = rendered.replace(&format!("{{{name}}}"), value);
        }
        rendered
    }
}

#[derive(Debug, Clone)]
pub struct InteractionModel {
    intents: HashMap<String, Intent>,
    phrases: Vec<SamplePhrase>,
    slot_types: SlotTypeRegistry,
    dialog_intents: HashMap<String, DialogIntent>,
    prompts: HashMap<String, Prompt>,
    invocation_name: Option<String>,
    audio_control: bool,
}

impl InteractionModel {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            HarnessError::Model(format!(
                "cannot read interaction model {}: {e}",
                path.as_ref().display()
            ))
        })?;
        let value: Value = serde_json::from_str(&raw)
            .map_err(|e| HarnessError::Model(format!("interaction model is not JSON: {e}")))?;
        Self::from_json(value)
    }

    pub fn from_json(value: Value) -> Result<Self> {
        let file: ModelFile = serde_json::from_value(value)
            .map_err(|e| HarnessError::Model(format!("malformed interaction model: {e}")))?;
        Self::build(file)
    }

    fn build(file: ModelFile) -> Result<Self> {
        let (intent_schemas, type_schemas, dialog_doc, prompt_schemas, invocation_name) =
            match file.interaction_model {
                Some(doc) => (
                    doc.language_model.intents,
                    doc.language_model.types,
                    doc.dialog,
                    doc.prompts,
                    doc.language_model.invocation_name,
                ),
                None => (file.intents, file.types, None, Vec::new(), None),
            };
        if intent_schemas.is_empty() {
            return Err(HarnessError::Model(
                "interaction model declares no intents".to_string(),
            ));
        }

        let slot_types = SlotTypeRegistry::build(&type_schemas)?;
        let mut intents = HashMap::new();
        let mut phrases = Vec::new();

        for schema in &intent_schemas {
            let intent = Intent {
                name: schema.name.clone(),
                slots: schema
                    .slots
                    .iter()
                    .map(|s| IntentSlot {
                        name: s.name.clone(),
                        slot_type: s.slot_type.clone(),
                    })
                    .collect(),
            };
            for sample in &schema.samples {
                let phrase = SamplePhrase::compile(&schema.name, sample)?;
                for slot_name in &phrase.slot_names {
                    if !intent.has_slot(slot_name) {
                        return Err(HarnessError::Model(format!(
                            "sample phrase {sample:?} references slot {slot_name:?} \
                             not declared on intent {}",
                            schema.name
                        )));
                    }
                }
                phrases.push(phrase);
            }
            intents.insert(schema.name.clone(), intent);
        }

        // Audio control needs both halves of the pause/resume pair.
        let audio_control = intents.contains_key(builtin::PAUSE_INTENT)
            && intents.contains_key(builtin::RESUME_INTENT);
        if audio_control {
            info!("audio control enabled, injecting builtin audio intents");
            for (name, samples) in builtin::AUDIO_BUILTIN_INTENTS {
                intents.entry((*name).to_string()).or_insert_with(|| Intent {
                    name: (*name).to_string(),
                    slots: Vec::new(),
                });
                for sample in *samples {
                    phrases.push(SamplePhrase::compile(name, sample)?);
                }
            }
        }

        let dialog_intents = dialog_doc
            .map(|doc| {
                doc.intents
                    .into_iter()
                    .map(|d| {
                        let intent = DialogIntent {
                            name: d.name.clone(),
                            confirmation_required: d.confirmation_required,
                            prompts: d.prompts,
                            slots: d
                                .slots
                                .into_iter()
                                .map(|s| DialogSlot {
                                    name: s.name,
                                    slot_type: s.slot_type,
                                    elicitation_required: s.elicitation_required,
                                    confirmation_required: s.confirmation_required,
                                    prompts: s.prompts,
                                })
                                .collect(),
                        };
                        (d.name, intent)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let prompts = prompt_schemas
            .into_iter()
            .map(|p| {
                let prompt = Prompt {
                    id: p.id.clone(),
                    variations: p.variations.into_iter().map(|v| v.value).collect(),
                };
                (p.id, prompt)
            })
            .collect();

        Ok(InteractionModel {
            intents,
            phrases,
            slot_types,
            dialog_intents,
            prompts,
            invocation_name,
            audio_control,
        })
    }

    pub fn intent(&self, name: &str) -> Option<&Intent> {
        self.intents.get(name)
    }

    pub fn dialog_intent(&self, name: &str) -> Option<&DialogIntent> {
        self.dialog_intents.get(name)
    }

    pub fn prompt(&self, id: &str) -> Option<&Prompt> {
        self.prompts.get(id)
    }

    pub fn slot_types(&self) -> &SlotTypeRegistry {
        &self.slot_types
    }

    pub fn invocation_name(&self) -> Option<&str> {
        self.invocation_name.as_deref()
    }

    pub fn audio_control_enabled(&self) -> bool {
        self.audio_control
    }

    pub fn match_utterance(&self, utterance: &str) -> Result<UtteranceMatch> {
        matcher::match_utterance(&self.phrases, &self.intents, &self.slot_types, utterance)
    }
}
