use std::path::Path;

use anyhow::{Context, Result, anyhow, ensure};
use earwise_play::{AutoPlayer, AutoplayConfig, Collaborators, GameSession};
use earwise_types::{GameConfig, GameSummary, PatternSet};
use log::info;

use crate::sinks::ConsoleSink;

/// Load the game configuration and pattern set, falling back to defaults for
/// missing paths.
pub fn load_inputs(
    config: Option<&Path>,
    patterns: Option<&Path>,
) -> Result<(GameConfig, PatternSet)> {
    let config = match config {
        Some(path) => GameConfig::load_from(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => GameConfig::default(),
    };
    let patterns = match patterns {
        Some(path) => PatternSet::load_from(path)
            .with_context(|| format!("reading patterns {}", path.display()))?,
        None => PatternSet::default(),
    };
    info!(
        "loaded {} pattern(s) from set '{}'",
        patterns.patterns.len(),
        patterns.name
    );
    Ok((config, patterns))
}

/// Run a whole game against simulated time with scripted taps.
pub fn run(
    config: &GameConfig,
    patterns: &PatternSet,
    autoplay: AutoplayConfig,
    frame_us: i64,
) -> Result<GameSummary> {
    ensure!(frame_us > 0, "frame step must be positive, got {frame_us}us");
    let sinks = Collaborators::new(
        ConsoleSink::stdout(false),
        ConsoleSink::stdout(false),
        ConsoleSink::stdout(false),
    );
    let mut session = GameSession::from_config(config, patterns, sinks)?;
    let mut player = AutoPlayer::new(autoplay);

    session.start();
    let mut simulated_us: i64 = 0;
    while !session.is_finished() {
        player.drive(&mut session, frame_us);
        simulated_us += frame_us;
    }
    info!(
        "simulated {:.1}s, {} tap(s) judged",
        simulated_us as f64 / 1_000_000.0,
        player.outcomes().len()
    );
    session
        .summary()
        .cloned()
        .ok_or_else(|| anyhow!("game ended without a summary"))
}
