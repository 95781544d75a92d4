//! Real-time play on a tokio runtime.
//!
//! Stdin lines are parsed on a reader task and queued on a single-consumer
//! channel. Each frame drains the queue before advancing the session, so a
//! tap that arrived while an onset's window was still open is judged before
//! the miss sweep can close it.

use std::time::Duration;

use anyhow::Result;
use earwise_play::GameSession;
use earwise_timing::{FrameTicker, SystemTimeProvider};
use earwise_types::GameSummary;
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// One line of player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    Tap,
    TogglePause,
    Quit,
}

impl InputCommand {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "p" | "P" => Self::TogglePause,
            "q" | "Q" => Self::Quit,
            _ => Self::Tap,
        }
    }
}

/// Apply a command to the session. Returns `false` once the game should stop.
pub fn apply(session: &mut GameSession, command: InputCommand) -> bool {
    match command {
        InputCommand::Tap => {
            session.tap();
        }
        InputCommand::TogglePause => {
            if session.is_paused() {
                session.resume();
                info!("resumed");
            } else {
                session.pause();
                info!("paused, send 'p' to resume");
            }
        }
        InputCommand::Quit => {
            session.cancel();
            return false;
        }
    }
    !session.is_finished()
}

/// One frame: queued input first, then the clock. Returns `false` once the
/// game should stop.
pub fn frame(
    session: &mut GameSession,
    commands: impl IntoIterator<Item = InputCommand>,
    dt_us: i64,
) -> bool {
    for command in commands {
        if !apply(session, command) {
            return false;
        }
    }
    session.tick(dt_us);
    !session.is_finished()
}

/// Run `session` to completion in real time. Returns `None` when cancelled.
pub fn run(session: GameSession, period: Duration) -> Result<Option<GameSummary>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(drive(session, period));
    // The stdin reader may still be parked in a blocking read.
    runtime.shutdown_background();
    result
}

async fn read_stdin(tx: mpsc::UnboundedSender<InputCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(InputCommand::parse(&line)).is_err() {
                    break;
                }
            }
            Ok(None) => {
                debug!("stdin closed");
                break;
            }
            Err(e) => {
                warn!("error reading stdin: {e}");
                break;
            }
        }
    }
}

async fn drive(mut session: GameSession, period: Duration) -> Result<Option<GameSummary>> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tokio::spawn(read_stdin(tx));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticker = FrameTicker::new(SystemTimeProvider::new());

    info!("press enter to tap, 'p' to pause, 'q' to quit");
    session.start();

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let queued = std::iter::from_fn(|| rx.try_recv().ok());
                if !frame(&mut session, queued, ticker.tick()) {
                    break;
                }
            }
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    warn!("ctrl-c handler failed: {e}");
                }
                session.cancel();
                break;
            }
        }
    }

    Ok(session.summary().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use earwise_play::{Collaborators, TrialPhase};
    use earwise_types::{EngineConfig, Pattern};

    fn session() -> GameSession {
        let config = EngineConfig {
            total_trials: 1,
            scoring_count_in: 0,
            ..EngineConfig::default()
        };
        GameSession::new(config, &vec![Pattern::new(60).note(1.0)], Collaborators::silent())
    }

    #[test]
    fn parse_lines() {
        assert_eq!(InputCommand::parse(""), InputCommand::Tap);
        assert_eq!(InputCommand::parse("  \n"), InputCommand::Tap);
        assert_eq!(InputCommand::parse("x"), InputCommand::Tap);
        assert_eq!(InputCommand::parse("p"), InputCommand::TogglePause);
        assert_eq!(InputCommand::parse(" Q "), InputCommand::Quit);
    }

    #[test]
    fn pause_toggles() {
        let mut s = session();
        s.start();
        assert!(apply(&mut s, InputCommand::TogglePause));
        assert!(s.is_paused());
        assert!(apply(&mut s, InputCommand::TogglePause));
        assert!(!s.is_paused());
    }

    #[test]
    fn quit_cancels() {
        let mut s = session();
        s.start();
        assert!(!apply(&mut s, InputCommand::Quit));
        assert_eq!(s.phase(), TrialPhase::Cancelled);
        assert!(s.summary().is_none());
    }

    #[test]
    fn tap_reaches_the_judge() {
        let mut s = session();
        s.start();
        while s.phase() != TrialPhase::Scoring {
            s.tick(10_000);
        }
        assert!(apply(&mut s, InputCommand::Tap));
        let judge = s.current_pass().and_then(|p| p.judge()).unwrap();
        assert_eq!(judge.hits(), 1);
    }

    #[test]
    fn queued_tap_beats_the_closing_sweep() {
        let mut s = session();
        s.start();
        while s.phase() != TrialPhase::Scoring {
            s.tick(10_000);
        }
        let elapsed = s.current_pass().unwrap().elapsed_us();
        s.tick(140_000 - elapsed);
        assert!(frame(&mut s, [InputCommand::Tap], 20_000));
        let judge = s.current_pass().and_then(|p| p.judge()).unwrap();
        assert!(judge.is_hit(0));
        assert_eq!(judge.misses(), 0);
    }

    #[test]
    fn quit_in_frame_stops_before_ticking() {
        let mut s = session();
        s.start();
        assert!(!frame(&mut s, [InputCommand::Tap, InputCommand::Quit], 10_000));
        assert_eq!(s.phase(), TrialPhase::Cancelled);
    }
}
