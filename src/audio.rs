//! Emulated device audio player.
//!
//! Activity is `Idle -> Playing <-> Stopped` with an orthogonal suspended
//! flag and a FIFO queue. Transition methods here only mutate state and
//! report what happened; the orchestrator owns the follow-up notification
//! round-trips so their depth-first ordering stays in one auditable place.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerActivity {
    Idle,
    Playing,
    Stopped,
}

impl PlayerActivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerActivity::Idle => "IDLE",
            PlayerActivity::Playing => "PLAYING",
            PlayerActivity::Stopped => "STOPPED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayBehavior {
    ReplaceAll,
    Enqueue,
    ReplaceEnqueued,
}

impl PlayBehavior {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "REPLACE_ALL" => Some(PlayBehavior::ReplaceAll),
            "ENQUEUE" => Some(PlayBehavior::Enqueue),
            "REPLACE_ENQUEUED" => Some(PlayBehavior::ReplaceEnqueued),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AudioItem {
    pub url: Option<String>,
    pub token: Option<String>,
    pub expected_previous_token: Option<String>,
    pub offset_in_milliseconds: u64,
}

impl AudioItem {
    /// Pull the stream fields out of an `AudioPlayer.Play` directive.
    pub fn from_directive(directive: &Value) -> Self {
        let stream = &directive["audioItem"]["stream"];
        AudioItem {
            url: stream["url"].as_str().map(str::to_string),
            token: stream["token"].as_str().map(str::to_string),
            expected_previous_token: stream["expectedPreviousToken"]
                .as_str()
                .map(str::to_string),
            offset_in_milliseconds: stream["offsetInMilliseconds"].as_u64().unwrap_or(0),
        }
    }
}

/// Outcome of attempting to start the head of the queue.
#[derive(Debug)]
pub(crate) enum StartAttempt {
    /// Nothing to do: already playing, or the queue is empty.
    NotStarted,
    /// Now playing; the orchestrator owes a started notification.
    Started,
    /// The item's url is missing or not HTTPS. The session must be
    /// terminated with an INVALID_RESPONSE error payload.
    InvalidUrl(String),
}

#[derive(Debug, Clone)]
pub struct AudioPlayer {
    activity: PlayerActivity,
    suspended: bool,
    queue: Vec<AudioItem>,
    current: Option<AudioItem>,
}

impl Default for AudioPlayer {
    fn default() -> Self {
        AudioPlayer {
            activity: PlayerActivity::Idle,
            suspended: false,
            queue: Vec::new(),
            current: None,
        }
    }
}

impl AudioPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activity(&self) -> PlayerActivity {
        self.activity
    }

    pub fn is_playing(&self) -> bool {
        self.activity == PlayerActivity::Playing
    }

    pub fn suspended(&self) -> bool {
        self.suspended
    }

    pub fn queue(&self) -> &[AudioItem] {
        &self.queue
    }

    /// The item most recently started, still reported while STOPPED.
    pub fn current(&self) -> Option<&AudioItem> {
        self.current.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().and_then(|i| i.token.as_deref())
    }

    pub fn offset(&self) -> u64 {
        self.current
            .as_ref()
            .map(|i| i.offset_in_milliseconds)
            .unwrap_or(0)
    }

    pub(crate) fn enqueue(&mut self, item: AudioItem, behavior: PlayBehavior) {
        debug!(?behavior, token = ?item.token, "audio enqueue");
        match behavior {
            // REPLACE_ALL's stop-if-playing happens before this call.
            PlayBehavior::ReplaceAll | PlayBehavior::ReplaceEnqueued => {
                self.queue.clear();
                self.queue.push(item);
            }
            PlayBehavior::Enqueue => self.queue.push(item),
        }
    }

    /// Stop playback. Returns true when something was actually playing, i.e.
    /// the orchestrator owes a stopped notification.
    pub(crate) fn stop(&mut self) -> bool {
        if self.activity != PlayerActivity::Playing {
            return false;
        }
        self.activity = PlayerActivity::Stopped;
        debug!(token = ?self.token(), "audio stopped");
        true
    }

    pub(crate) fn try_start_next(&mut self) -> StartAttempt {
        if self.is_playing() || self.queue.is_empty() {
            return StartAttempt::NotStarted;
        }
        let item = self.queue.remove(0);
        match &item.url {
            None => StartAttempt::InvalidUrl(
                "The URL specified in the Play directive must be defined".to_string(),
            ),
            Some(url) if !url.starts_with("https") => StartAttempt::InvalidUrl(
                "The URL specified in the Play directive must be HTTPS".to_string(),
            ),
            Some(_) => {
                self.activity = PlayerActivity::Playing;
                debug!(token = ?item.token, "audio playing");
                self.current = Some(item);
                StartAttempt::Started
            }
        }
    }

    /// Suspend around intent handling. Returns true when playback was live
    /// and a stopped notification is owed.
    pub(crate) fn suspend(&mut self) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.suspended = true;
        self.activity = PlayerActivity::Stopped;
        debug!("audio suspended");
        true
    }

    /// Drop the suspended flag without touching activity. Used when a Stop
    /// directive arrives while playback is already suspended.
    pub(crate) fn clear_suspended(&mut self) {
        self.suspended = false;
    }

    /// Clear suspension. Returns true when playback restarts and a started
    /// notification is owed.
    pub(crate) fn resume(&mut self) -> bool {
        self.suspended = false;
        if self.is_playing() {
            return false;
        }
        self.activity = PlayerActivity::Playing;
        debug!("audio resumed");
        true
    }

    /// Mark the current item as played to completion.
    pub(crate) fn finish(&mut self) {
        if self.activity == PlayerActivity::Playing {
            self.activity = PlayerActivity::Stopped;
        }
    }
}
