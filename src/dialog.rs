//! Multi-turn dialog state machine.
//!
//! Phases advance `Started -> InProgress -> Completed` and never regress
//! within a session. Transitions are driven exclusively by the directives the
//! handler returns; the harness itself only accumulates slot observations and
//! replays them into the next outgoing request so the handler always sees
//! cumulative context.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{HarnessError, Result};
use crate::model::InteractionModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DialogPhase {
    Started,
    InProgress,
    Completed,
}

impl DialogPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogPhase::Started => "STARTED",
            DialogPhase::InProgress => "IN_PROGRESS",
            DialogPhase::Completed => "COMPLETED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfirmationStatus {
    None,
    Confirmed,
    Denied,
}

impl ConfirmationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationStatus::None => "NONE",
            ConfirmationStatus::Confirmed => "CONFIRMED",
            ConfirmationStatus::Denied => "DENIED",
        }
    }

    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("CONFIRMED") => ConfirmationStatus::Confirmed,
            Some("DENIED") => ConfirmationStatus::Denied,
            _ => ConfirmationStatus::None,
        }
    }
}

/// Accumulated observation for one slot.
#[derive(Debug, Clone)]
pub struct DialogSlotState {
    pub name: String,
    pub value: Option<String>,
    pub confirmation: ConfirmationStatus,
    pub resolutions: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct DialogState {
    intent: Option<String>,
    phase: Option<DialogPhase>,
    confirmation: Option<ConfirmationStatus>,
    slots: HashMap<String, DialogSlotState>,
}

impl DialogState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Option<DialogPhase> {
        self.phase
    }

    pub fn confirmation(&self) -> ConfirmationStatus {
        self.confirmation.unwrap_or(ConfirmationStatus::None)
    }

    pub fn active_intent(&self) -> Option<&str> {
        self.intent.as_deref()
    }

    pub fn slots(&self) -> &HashMap<String, DialogSlotState> {
        &self.slots
    }

    pub fn slot(&self, name: &str) -> Option<&DialogSlotState> {
        self.slots.get(name)
    }

    /// Current resolved slot values, for prompt interpolation.
    pub fn slot_values(&self) -> HashMap<String, String> {
        self.slots
            .iter()
            .filter_map(|(name, s)| s.value.clone().map(|v| (name.clone(), v)))
            .collect()
    }

    /// Begin a turn for a dialog intent. Switching to a different dialog
    /// intent abandons the old accumulation: the session-end reset rule
    /// applies within one exchange, and a new intent opens a new exchange.
    pub fn activate(&mut self, intent: &str) {
        if self.intent.as_deref() != Some(intent) {
            self.reset();
            self.intent = Some(intent.to_string());
        }
    }

    /// The dialog exists from the first turn of a dialog intent, even before
    /// any directive has moved it along.
    pub fn ensure_started(&mut self) {
        if self.phase.is_none() {
            self.phase = Some(DialogPhase::Started);
        }
    }

    /// Record a slot observation. A value-less placeholder never erases an
    /// existing value, resolution, or confirmation.
    pub fn update_slot(
        &mut self,
        name: &str,
        value: Option<String>,
        confirmation: ConfirmationStatus,
        resolutions: Option<Value>,
    ) {
        match self.slots.get_mut(name) {
            Some(existing) => {
                if value.is_some() {
                    existing.value = value;
                    existing.confirmation = confirmation;
                    existing.resolutions = resolutions;
                }
            }
            None => {
                self.slots.insert(
                    name.to_string(),
                    DialogSlotState {
                        name: name.to_string(),
                        value,
                        confirmation,
                        resolutions,
                    },
                );
            }
        }
    }

    /// Fold a `Dialog.*` directive returned by the handler into the state.
    pub fn handle_directive(&mut self, directive: &Value, model: &InteractionModel) -> Result<()> {
        let directive_type = directive["type"].as_str().unwrap_or_default();
        let updated_intent = directive.get("updatedIntent");
        let intent_name = updated_intent
            .and_then(|u| u["name"].as_str())
            .map(str::to_string)
            .or_else(|| self.intent.clone())
            .ok_or_else(|| {
                HarnessError::Dialog(format!(
                    "{directive_type} directive without an intent in scope"
                ))
            })?;
        if model.dialog_intent(&intent_name).is_none() {
            return Err(HarnessError::Dialog(format!(
                "directive {directive_type} references intent {intent_name:?} \
                 which is not dialog-capable"
            )));
        }
        self.activate(&intent_name);

        match directive_type {
            "Dialog.Delegate" => {
                self.confirmation = Some(ConfirmationStatus::None);
                self.phase = Some(match self.phase {
                    None => DialogPhase::Started,
                    Some(DialogPhase::Started) => DialogPhase::InProgress,
                    Some(p) => p,
                });
            }
            "Dialog.ElicitSlot" | "Dialog.ConfirmSlot" => {
                if let Some(updated) = updated_intent {
                    self.merge_updated_intent(updated);
                }
            }
            "Dialog.ConfirmIntent" => {
                if let Some(updated) = updated_intent {
                    self.merge_updated_intent(updated);
                }
                self.phase = Some(DialogPhase::Completed);
            }
            other => {
                return Err(HarnessError::Dialog(format!(
                    "unsupported dialog directive type {other:?}"
                )));
            }
        }
        debug!(intent = %intent_name, phase = ?self.phase, "dialog directive applied");
        Ok(())
    }

    fn merge_updated_intent(&mut self, updated: &Value) {
        if let Some(status) = updated["confirmationStatus"].as_str() {
            self.confirmation = Some(ConfirmationStatus::parse(Some(status)));
        }
        let Some(slots) = updated["slots"].as_object() else {
            return;
        };
        for (name, slot) in slots {
            let value = slot["value"].as_str().map(str::to_string);
            let confirmation = ConfirmationStatus::parse(slot["confirmationStatus"].as_str());
            let resolutions = slot.get("resolutionsPerAuthority").cloned();
            self.update_slot(name, value, confirmation, resolutions);
        }
    }

    /// Clears everything. Called on session end, and by [`activate`] when a
    /// different dialog intent takes over mid-session.
    ///
    /// [`activate`]: DialogState::activate
    pub fn reset(&mut self) {
        self.intent = None;
        self.phase = None;
        self.confirmation = None;
        self.slots.clear();
    }
}
