// Pass runner, trial sequencing, the host-facing game trait and autoplay

pub mod autoplay;
pub mod pass_runner;
pub mod rhythm_game;
pub mod session;

pub use autoplay::{AutoPlayer, AutoplayConfig, ScriptedTaps};
pub use pass_runner::{PassPhase, PassRunner, PassSinks, PassTuning};
pub use rhythm_game::RhythmGame;
pub use session::{Collaborators, FinishedCallback, GameSession, TrialPhase};
