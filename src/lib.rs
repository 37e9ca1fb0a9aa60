//! Local test harness for conversational-voice-assistant skills.
//!
//! The harness emulates the assistant platform's request/response protocol so
//! a skill handler can be exercised end-to-end without hardware or a live
//! platform connection. Free-text utterances are matched against the skill's
//! sample phrases, session/dialog/audio-player state is tracked across turns,
//! and the handler's response comes back wrapped with accessors.

pub mod audio;
pub mod dialog;
pub mod error;
pub mod handler;
pub mod harness;
pub mod model;
pub mod protocol;

pub use audio::{AudioItem, AudioPlayer, PlayBehavior, PlayerActivity};
pub use dialog::{ConfirmationStatus, DialogPhase, DialogState};
pub use error::{HarnessError, Result};
pub use handler::{HttpHandler, SkillHandler};
pub use harness::{SkillHarness, SkillHarnessBuilder};
pub use model::InteractionModel;
pub use protocol::SkillResponse;
