//! Wire-protocol types: request envelope construction, the session/device
//! context, and the response wrapper returned to test authors.

pub mod request;
pub mod response;
pub mod session;

pub use request::{
    build_envelope, PlaybackEvent, RequestKind, RequestSlot, SessionEndedReason, SessionError,
};
pub use response::SkillResponse;
pub use session::{Device, Session, SkillContext};
