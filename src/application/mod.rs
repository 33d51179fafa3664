//! Application layer - The skill runtime and its bus handlers.
//!
//! [`SkillRuntime`] wires one [`ConverseSkill`] to the ports. Its behavior
//! is split by concern:
//!
//! - `activation` - activate/deactivate requests
//! - `converse` - converse requests, converse intents, force timeout
//! - `collector` - `get_response` and its abort handling
//! - `dispatch` - lifecycle wrapper around every skill handler
//! - `speech` - speaking, dialogs and vocabularies
//! - `ask` - yes/no and selection questions
//! - `stop` - stop pings and stop requests
//! - `probe` - intent service queries

mod activation;
mod ask;
mod collector;
mod converse;
mod dispatch;
mod errors;
mod handler;
mod probe;
mod runtime;
mod skill;
mod speech;
mod stop;

#[cfg(test)]
pub(crate) mod testing;

pub use activation::{ActivationController, INDEFINITE_ACTIVATION, SKILLS_ACTIVATE, SKILLS_DEACTIVATE};
pub use ask::{SelectionRequest, DEFAULT_SELECTION_MIN_CONF};
pub use collector::{
    OnFail, ResponseRequest, ABORT_QUESTION, GET_RESPONSE_DISABLE, GET_RESPONSE_ENABLE,
    MIC_LISTEN, RECORD_BEGIN, RECORD_END,
};
pub use converse::{CONVERSE_PONG, CONVERSE_RESPONSE, FORCE_TIMEOUT};
pub use dispatch::{DispatchOutcome, EventDispatchWrapper, SKILL_ERROR_DIALOG, UTTERANCE_HANDLED};
pub use errors::HandlerError;
pub use handler::{handler_fn, FnHandler, HandlerOptions, SkillHandler, SKILL_HANDLER_INFO};
pub use probe::{INTENT_GET, INTENT_REPLY};
pub use runtime::{SkillPorts, SkillRuntime, SETTINGS_CHANGED};
pub use skill::ConverseSkill;
pub use speech::{ACKNOWLEDGE_SOUND, PLAY_SOUND, SPEAK};
pub use stop::{GLOBAL_STOP, STOP_PONG};
