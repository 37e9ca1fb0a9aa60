//! Typed request kinds and the JSON envelope builder.
//!
//! Request shapes are a closed variant set validated at construction, rather
//! than loosely-typed maps, so a malformed request is impossible to build.

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::session::SkillContext;
use crate::audio::{AudioPlayer, PlayerActivity};
use crate::dialog::{ConfirmationStatus, DialogPhase};

/// A slot assignment carried on an intent request.
#[derive(Debug, Clone)]
pub struct RequestSlot {
    pub name: String,
    pub value: Option<String>,
    pub confirmation: ConfirmationStatus,
    pub resolutions: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started,
    Stopped,
    NearlyFinished,
    Finished,
}

impl PlaybackEvent {
    pub fn request_type(&self) -> &'static str {
        match self {
            PlaybackEvent::Started => "AudioPlayer.PlaybackStarted",
            PlaybackEvent::Stopped => "AudioPlayer.PlaybackStopped",
            PlaybackEvent::NearlyFinished => "AudioPlayer.PlaybackNearlyFinished",
            PlaybackEvent::Finished => "AudioPlayer.PlaybackFinished",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEndedReason {
    UserInitiated,
    Error,
    ExceededMaxReprompts,
}

impl SessionEndedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionEndedReason::UserInitiated => "USER_INITIATED",
            SessionEndedReason::Error => "ERROR",
            SessionEndedReason::ExceededMaxReprompts => "EXCEEDED_MAX_REPROMPTS",
        }
    }
}

#[derive(Debug, Clone)]
pub enum RequestKind {
    Launch,
    Intent {
        name: String,
        slots: Vec<RequestSlot>,
        confirmation: ConfirmationStatus,
        dialog_state: Option<DialogPhase>,
    },
    SessionEnded {
        reason: SessionEndedReason,
        error: Option<SessionError>,
    },
    ElementSelected {
        token: String,
    },
    ConnectionsResponse {
        name: String,
        payload: Value,
        token: String,
        status_code: u64,
        status_message: String,
    },
    Playback {
        event: PlaybackEvent,
        token: Option<String>,
        offset_in_milliseconds: u64,
    },
}

#[derive(Debug, Clone)]
pub struct SessionError {
    pub error_type: String,
    pub message: String,
}

impl RequestKind {
    pub fn request_type(&self) -> &'static str {
        match self {
            RequestKind::Launch => "LaunchRequest",
            RequestKind::Intent { .. } => "IntentRequest",
            RequestKind::SessionEnded { .. } => "SessionEndedRequest",
            RequestKind::ElementSelected { .. } => "Display.ElementSelected",
            RequestKind::ConnectionsResponse { .. } => "Connections.Response",
            RequestKind::Playback { event, .. } => event.request_type(),
        }
    }

    /// Session objects are attached only to these request types.
    pub fn session_bearing(&self) -> bool {
        matches!(
            self,
            RequestKind::Launch
                | RequestKind::Intent { .. }
                | RequestKind::SessionEnded { .. }
                | RequestKind::ElementSelected { .. }
                | RequestKind::ConnectionsResponse { .. }
        )
    }

    /// True when the user spoke: suspend/resume of audio applies.
    pub fn carries_intent(&self) -> bool {
        matches!(self, RequestKind::Intent { .. })
    }
}

/// Assemble the full protocol envelope for one outgoing request.
pub fn build_envelope(kind: &RequestKind, context: &SkillContext, audio: &AudioPlayer) -> Value {
    let mut envelope = Map::new();
    envelope.insert("version".to_string(), json!("1.0"));
    envelope.insert(
        "context".to_string(),
        build_context(context, audio),
    );
    if kind.session_bearing() {
        if let Some(session) = context.session() {
            let mut session_json = json!({
                "new": session.is_new(),
                "sessionId": session.id(),
                "application": { "applicationId": context.application_id },
                "user": { "userId": context.user_id },
            });
            // Launch starts fresh; attributes are prior-turn state.
            if !matches!(kind, RequestKind::Launch) {
                session_json["attributes"] = Value::Object(session.attributes().clone());
            }
            envelope.insert("session".to_string(), session_json);
        }
    }
    envelope.insert("request".to_string(), build_request(kind, context));
    Value::Object(envelope)
}

fn build_context(context: &SkillContext, audio: &AudioPlayer) -> Value {
    let supported_interfaces = if context.device.audio_player_supported {
        json!({ "AudioPlayer": {} })
    } else {
        json!({})
    };
    let mut ctx = json!({
        "System": {
            "application": { "applicationId": context.application_id },
            "user": { "userId": context.user_id },
            "device": {
                "deviceId": context.device.id,
                "supportedInterfaces": supported_interfaces,
            },
            "apiEndpoint": context.api_endpoint,
            "apiAccessToken": context.api_access_token,
        }
    });
    if context.device.audio_player_supported {
        let mut player = json!({ "playerActivity": audio.activity().as_str() });
        // Token and offset only exist once something has been played.
        if audio.activity() != PlayerActivity::Idle {
            player["token"] = json!(audio.token().unwrap_or_default());
            player["offsetInMilliseconds"] = json!(audio.offset());
        }
        ctx["AudioPlayer"] = player;
    }
    ctx
}

fn build_request(kind: &RequestKind, context: &SkillContext) -> Value {
    let mut request = json!({
        "type": kind.request_type(),
        "requestId": format!("amzn1.echo-api.request.{}", Uuid::new_v4()),
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        "locale": context.locale,
    });
    match kind {
        RequestKind::Launch => {}
        RequestKind::Intent {
            name,
            slots,
            confirmation,
            dialog_state,
        } => {
            let mut slot_map = Map::new();
            for slot in slots {
                let mut slot_json = json!({
                    "name": slot.name,
                    "confirmationStatus": slot.confirmation.as_str(),
                });
                if let Some(value) = &slot.value {
                    slot_json["value"] = json!(value);
                }
                if let Some(resolutions) = &slot.resolutions {
                    slot_json["resolutionsPerAuthority"] = resolutions.clone();
                }
                slot_map.insert(slot.name.clone(), slot_json);
            }
            request["intent"] = json!({
                "name": name,
                "confirmationStatus": confirmation.as_str(),
                "slots": Value::Object(slot_map),
            });
            if let Some(phase) = dialog_state {
                request["dialogState"] = json!(phase.as_str());
            }
        }
        RequestKind::SessionEnded { reason, error } => {
            request["reason"] = json!(reason.as_str());
            if let Some(error) = error {
                request["error"] = json!({
                    "type": error.error_type,
                    "message": error.message,
                });
            }
        }
        RequestKind::ElementSelected { token } => {
            request["token"] = json!(token);
        }
        RequestKind::ConnectionsResponse {
            name,
            payload,
            token,
            status_code,
            status_message,
        } => {
            request["name"] = json!(name);
            request["payload"] = payload.clone();
            request["token"] = json!(token);
            request["status"] = json!({
                "code": status_code,
                "message": status_message,
            });
        }
        RequestKind::Playback {
            token,
            offset_in_milliseconds,
            ..
        } => {
            request["token"] = json!(token.clone().unwrap_or_default());
            request["offsetInMilliseconds"] = json!(offset_in_milliseconds);
        }
    }
    request
}
