//! Request/response orchestration.
//!
//! [`SkillHarness`] owns every piece of emulated state (session, device,
//! dialog, audio player) and drives the per-call pipeline: suspend audio if
//! the user spoke over playback, build the envelope, run the filter hook,
//! invoke the handler, fold session attributes and directives back into the
//! state machines, then resume audio. Directive-triggered notifications are
//! nested depth-first dispatches through the same entry point, so a stop
//! round-trip completes (directives and all) before the outer call continues.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use serde_json::Value;
use tracing::{debug, info};

use crate::audio::{AudioItem, AudioPlayer, PlayBehavior, StartAttempt};
use crate::dialog::{ConfirmationStatus, DialogState};
use crate::error::{HarnessError, Result};
use crate::handler::{HttpHandler, SkillHandler};
use crate::model::{builtin, InteractionModel};
use crate::protocol::{
    build_envelope, PlaybackEvent, RequestKind, RequestSlot, SessionEndedReason, SessionError,
    SkillContext, SkillResponse,
};

type RequestFilter = Box<dyn FnMut(&mut Value) + Send>;

type DispatchFuture<'a> = Pin<Box<dyn Future<Output = Result<SkillResponse>> + Send + 'a>>;

pub struct SkillHarness {
    model: InteractionModel,
    context: SkillContext,
    audio: AudioPlayer,
    dialog: DialogState,
    handler: Box<dyn SkillHandler>,
    filter: Option<RequestFilter>,
}

impl SkillHarness {
    pub fn builder() -> SkillHarnessBuilder {
        SkillHarnessBuilder::new()
    }

    pub fn model(&self) -> &InteractionModel {
        &self.model
    }

    pub fn context(&self) -> &SkillContext {
        &self.context
    }

    pub fn audio_player(&self) -> &AudioPlayer {
        &self.audio
    }

    pub fn dialog(&self) -> &DialogState {
        &self.dialog
    }

    /// Install a hook that may mutate each outgoing request JSON just before
    /// it reaches the handler.
    pub fn request_filter(&mut self, filter: impl FnMut(&mut Value) + Send + 'static) {
        self.filter = Some(Box::new(filter));
    }

    pub fn clear_request_filter(&mut self) {
        self.filter = None;
    }

    pub async fn launch(&mut self) -> Result<SkillResponse> {
        self.dispatch(RequestKind::Launch).await
    }

    /// Match free text against the sample-phrase corpus and send the winning
    /// intent. Fails with [`HarnessError::NoMatch`] when nothing qualifies.
    pub async fn utter(&mut self, utterance: &str) -> Result<SkillResponse> {
        let matched = self.model.match_utterance(utterance)?;
        let provided = matched
            .slots
            .into_iter()
            .map(|s| (s.name, s.value))
            .collect();
        self.send_intent(matched.intent, provided).await
    }

    /// Send an intent by name with no slot values.
    pub async fn intend(&mut self, intent_name: &str) -> Result<SkillResponse> {
        self.intend_with_slots(intent_name, HashMap::new()).await
    }

    /// Send an intent by name with explicit slot values. Unknown non-builtin
    /// intents and undeclared slot names are rejected before dispatch.
    pub async fn intend_with_slots(
        &mut self,
        intent_name: &str,
        slots: HashMap<String, String>,
    ) -> Result<SkillResponse> {
        let intent = self.model.intent(intent_name);
        if intent.is_none() && !builtin::is_builtin_intent(intent_name) {
            return Err(HarnessError::Invocation(format!(
                "intent {intent_name:?} is not in the interaction model"
            )));
        }
        for name in slots.keys() {
            let declared = intent.map(|i| i.has_slot(name)).unwrap_or(false);
            if !declared {
                return Err(HarnessError::Invocation(format!(
                    "slot {name:?} is not declared on intent {intent_name:?}"
                )));
            }
        }
        let provided = slots.into_iter().collect();
        self.send_intent(intent_name.to_string(), provided).await
    }

    /// Send an explicit SessionEndedRequest and destroy the session.
    pub async fn end_session(&mut self) -> Result<SkillResponse> {
        self.dispatch(RequestKind::SessionEnded {
            reason: SessionEndedReason::UserInitiated,
            error: None,
        })
        .await
    }

    pub async fn element_selected(&mut self, token: &str) -> Result<SkillResponse> {
        self.dispatch(RequestKind::ElementSelected {
            token: token.to_string(),
        })
        .await
    }

    pub async fn connections_response(
        &mut self,
        name: &str,
        payload: Value,
        token: &str,
        status_code: u64,
        status_message: &str,
    ) -> Result<SkillResponse> {
        self.dispatch(RequestKind::ConnectionsResponse {
            name: name.to_string(),
            payload,
            token: token.to_string(),
            status_code,
            status_message: status_message.to_string(),
        })
        .await
    }

    /// Device event: playback of the current item began.
    pub async fn playback_started(&mut self) -> Result<SkillResponse> {
        self.notify_playback(PlaybackEvent::Started).await
    }

    /// Device event: playback of the current item stopped. The player leaves
    /// PLAYING before the skill hears about it.
    pub async fn playback_stopped(&mut self) -> Result<SkillResponse> {
        self.audio.stop();
        self.notify_playback(PlaybackEvent::Stopped).await
    }

    /// Device event: the current item is almost done. Handlers typically
    /// respond with an ENQUEUE Play directive.
    pub async fn playback_nearly_finished(&mut self) -> Result<SkillResponse> {
        self.notify_playback(PlaybackEvent::NearlyFinished).await
    }

    /// Device event: the current item played to completion. The next queued
    /// item, if any, starts afterwards.
    pub async fn playback_finished(&mut self) -> Result<SkillResponse> {
        self.audio.finish();
        let response = self.notify_playback(PlaybackEvent::Finished).await?;
        if let StartAttempt::Started = self.audio.try_start_next() {
            self.notify_playback(PlaybackEvent::Started).await?;
        }
        Ok(response)
    }

    async fn send_intent(
        &mut self,
        intent_name: String,
        provided: Vec<(String, String)>,
    ) -> Result<SkillResponse> {
        let dialog_capable = self.model.dialog_intent(&intent_name).is_some();
        let mut slots: Vec<RequestSlot> = Vec::new();

        // Declared slots ride along as unfilled placeholders.
        if let Some(intent) = self.model.intent(&intent_name) {
            for slot in &intent.slots {
                slots.push(RequestSlot {
                    name: slot.name.clone(),
                    value: None,
                    confirmation: ConfirmationStatus::None,
                    resolutions: None,
                });
            }
        }

        // Replay accumulated dialog state so the handler sees cumulative
        // context, then layer this turn's slots on top.
        if dialog_capable {
            self.dialog.activate(&intent_name);
            self.dialog.ensure_started();
            for state in self.dialog.slots().values() {
                upsert(
                    &mut slots,
                    RequestSlot {
                        name: state.name.clone(),
                        value: state.value.clone(),
                        confirmation: state.confirmation,
                        resolutions: state.resolutions.clone(),
                    },
                );
            }
        }

        for (name, raw_value) in provided {
            let slot_type = self
                .model
                .intent(&intent_name)
                .and_then(|i| i.slot_type_of(&name))
                .map(str::to_string);
            let resolution = self.model.slot_types().resolve(slot_type.as_deref(), &raw_value);
            let resolutions = self.model.slot_types().resolutions_per_authority(
                slot_type.as_deref(),
                &resolution,
                &self.context.application_id,
            );
            let slot = RequestSlot {
                name: name.clone(),
                value: Some(resolution.value.clone()),
                confirmation: ConfirmationStatus::None,
                resolutions: resolutions.clone(),
            };
            if dialog_capable {
                self.dialog.update_slot(
                    &name,
                    Some(resolution.value.clone()),
                    ConfirmationStatus::None,
                    resolutions,
                );
            }
            upsert(&mut slots, slot);
        }

        let kind = RequestKind::Intent {
            name: intent_name,
            slots,
            confirmation: if dialog_capable {
                self.dialog.confirmation()
            } else {
                ConfirmationStatus::None
            },
            dialog_state: if dialog_capable { self.dialog.phase() } else { None },
        };
        self.dispatch(kind).await
    }

    async fn notify_playback(&mut self, event: PlaybackEvent) -> Result<SkillResponse> {
        let kind = RequestKind::Playback {
            event,
            token: self.audio.token().map(str::to_string),
            offset_in_milliseconds: self.audio.offset(),
        };
        self.dispatch(kind).await
    }

    /// The single dispatch entry point. Boxed so directive processing can
    /// recurse into it for notification round-trips; every nested dispatch
    /// completes before its parent continues.
    fn dispatch(&mut self, kind: RequestKind) -> DispatchFuture<'_> {
        Box::pin(async move {
            // The handler must observe a consistent "not playing" view while
            // it reasons about the user's utterance.
            if kind.carries_intent() && self.audio.suspend() {
                self.notify_playback(PlaybackEvent::Stopped).await?;
            }

            if kind.session_bearing() {
                self.context.ensure_session();
            }
            let mut envelope = build_envelope(&kind, &self.context, &self.audio);
            if let Some(filter) = &mut self.filter {
                filter(&mut envelope);
            }
            if kind.session_bearing() {
                if let Some(session) = self.context.session_mut() {
                    session.mark_used();
                }
            }

            info!(request_type = kind.request_type(), "dispatching to skill");
            let raw = self
                .handler
                .handle(envelope)
                .await
                .map_err(HarnessError::Handler)?;
            let response = SkillResponse::new(raw);

            if kind.session_bearing() {
                if let Some(attrs) = response.raw()["sessionAttributes"].as_object().cloned() {
                    if let Some(session) = self.context.session_mut() {
                        session.set_attributes(attrs);
                    }
                }
            }

            self.fold_directives(&response).await?;

            let session_over = matches!(kind, RequestKind::SessionEnded { .. })
                || response.should_end_session() == Some(true);
            if session_over && self.context.has_session() {
                debug!("session ended");
                self.context.end_session();
                self.dialog.reset();
            }

            // Resume playback suspended for this utterance, once every
            // directive (and nested round-trip) has settled.
            if kind.carries_intent() && self.audio.suspended() && self.audio.resume() {
                self.notify_playback(PlaybackEvent::Started).await?;
            }

            Ok(response)
        })
    }

    /// Fold returned directives into the dialog and audio state machines.
    async fn fold_directives(&mut self, response: &SkillResponse) -> Result<()> {
        let directives: Vec<Value> = response.directives().to_vec();
        for directive in directives {
            let directive_type = directive["type"].as_str().unwrap_or_default();
            match directive_type {
                t if t.starts_with("Dialog.") => {
                    self.dialog.handle_directive(&directive, &self.model)?;
                }
                "AudioPlayer.Play" => self.apply_play_directive(&directive).await?,
                "AudioPlayer.Stop" => {
                    if self.audio.suspended() {
                        // The skill stopped its own suspended playback; no
                        // activity change, nothing to resume later.
                        self.audio.clear_suspended();
                    } else if self.audio.stop() {
                        self.notify_playback(PlaybackEvent::Stopped).await?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    async fn apply_play_directive(&mut self, directive: &Value) -> Result<()> {
        let behavior = directive["playBehavior"]
            .as_str()
            .and_then(PlayBehavior::parse)
            .unwrap_or(PlayBehavior::ReplaceAll);
        let item = AudioItem::from_directive(directive);

        if behavior == PlayBehavior::ReplaceAll && self.audio.stop() {
            self.notify_playback(PlaybackEvent::Stopped).await?;
        }
        self.audio.enqueue(item, behavior);
        match self.audio.try_start_next() {
            StartAttempt::Started => {
                self.notify_playback(PlaybackEvent::Started).await?;
            }
            StartAttempt::InvalidUrl(message) => {
                // Not a local error: the device reports the bad directive by
                // tearing the session down through the handler.
                self.dispatch(RequestKind::SessionEnded {
                    reason: SessionEndedReason::Error,
                    error: Some(SessionError {
                        error_type: "INVALID_RESPONSE".to_string(),
                        message,
                    }),
                })
                .await?;
            }
            StartAttempt::NotStarted => {}
        }
        Ok(())
    }
}

/// Fluent configuration for a [`SkillHarness`].
pub struct SkillHarnessBuilder {
    model_json: Option<Value>,
    model_path: Option<PathBuf>,
    handler: Option<Box<dyn SkillHandler>>,
    locale: String,
    application_id: Option<String>,
    audio_player: bool,
}

impl SkillHarnessBuilder {
    pub fn new() -> Self {
        SkillHarnessBuilder {
            model_json: None,
            model_path: None,
            handler: None,
            locale: "en-US".to_string(),
            application_id: None,
            audio_player: true,
        }
    }

    pub fn interaction_model(mut self, model: Value) -> Self {
        self.model_json = Some(model);
        self
    }

    pub fn interaction_model_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    pub fn handler(mut self, handler: impl SkillHandler + 'static) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Remote mode: POST each request to this skill endpoint.
    pub fn skill_url(mut self, url: impl Into<String>) -> Self {
        self.handler = Some(Box::new(HttpHandler::new(url)));
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn application_id(mut self, id: impl Into<String>) -> Self {
        self.application_id = Some(id.into());
        self
    }

    /// Whether the emulated device declares AudioPlayer support. On by
    /// default.
    pub fn audio_player(mut self, supported: bool) -> Self {
        self.audio_player = supported;
        self
    }

    pub fn build(self) -> Result<SkillHarness> {
        let model = match (self.model_json, self.model_path) {
            (Some(json), _) => InteractionModel::from_json(json)?,
            (None, Some(path)) => InteractionModel::from_file(path)?,
            (None, None) => {
                return Err(HarnessError::Model(
                    "no interaction model configured".to_string(),
                ))
            }
        };
        let handler = self.handler.ok_or_else(|| {
            HarnessError::Invocation("no skill handler configured".to_string())
        })?;
        Ok(SkillHarness {
            model,
            context: SkillContext::new(self.application_id, self.locale, self.audio_player),
            audio: AudioPlayer::new(),
            dialog: DialogState::new(),
            handler,
            filter: None,
        })
    }
}

impl Default for SkillHarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn upsert(slots: &mut Vec<RequestSlot>, slot: RequestSlot) {
    match slots.iter_mut().find(|s| s.name == slot.name) {
        Some(existing) => *existing = slot,
        None => slots.push(slot),
    }
}
