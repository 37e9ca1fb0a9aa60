//! Session and emulated-device state owned by one harness instance.

use serde_json::{Map, Value};
use uuid::Uuid;

/// One platform session. Created lazily on the first session-bearing request
/// and destroyed when the handler ends it or the harness sends an explicit
/// end-session request.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    is_new: bool,
    attributes: Map<String, Value>,
}

impl Session {
    pub fn new() -> Self {
        Session {
            id: format!("amzn1.echo-api.session.{}", Uuid::new_v4()),
            is_new: true,
            attributes: Map::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// The first request observes the session as new; later ones do not.
    pub fn mark_used(&mut self) {
        self.is_new = false;
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn set_attributes(&mut self, attributes: Map<String, Value>) {
        self.attributes = attributes;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct Device {
    pub id: String,
    pub audio_player_supported: bool,
}

impl Device {
    pub fn new(audio_player_supported: bool) -> Self {
        Device {
            id: format!("virtualDevice.{}", Uuid::new_v4()),
            audio_player_supported,
        }
    }
}

/// Identity and lifecycle state shared by every request the harness builds.
/// Owned by exactly one harness instance, never global.
#[derive(Debug, Clone)]
pub struct SkillContext {
    pub application_id: String,
    pub user_id: String,
    pub api_access_token: String,
    pub api_endpoint: String,
    pub locale: String,
    pub device: Device,
    session: Option<Session>,
}

impl SkillContext {
    pub fn new(application_id: Option<String>, locale: String, audio_player: bool) -> Self {
        SkillContext {
            application_id: application_id
                .unwrap_or_else(|| format!("amzn1.ask.skill.{}", Uuid::new_v4())),
            user_id: format!("amzn1.ask.account.{}", Uuid::new_v4()),
            api_access_token: format!("virtualToken.{}", Uuid::new_v4()),
            api_endpoint: "https://api.amazonalexa.com".to_string(),
            locale,
            device: Device::new(audio_player),
            session: None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    /// Lazily create the session for a session-bearing request.
    pub fn ensure_session(&mut self) -> &mut Session {
        self.session.get_or_insert_with(Session::new)
    }

    pub fn end_session(&mut self) {
        self.session = None;
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }
}
