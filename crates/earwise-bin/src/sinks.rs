//! Text presentation layer for the command-line front end.

use std::io::{self, Stdout, Write};

use earwise_types::{
    ClickCue, CueSink, FeedbackEvent, FeedbackSink, FeedbackTier, GameSummary, MarkerCue,
    ResultSink, TrialResult,
};
use log::{debug, trace, warn};

/// Writes cues, feedback and results as lines of text.
///
/// With `echo` off everything goes to the log instead, which keeps simulated
/// runs quiet.
pub struct ConsoleSink<W: Write> {
    out: W,
    echo: bool,
}

impl ConsoleSink<Stdout> {
    pub fn stdout(echo: bool) -> Self {
        Self::new(io::stdout(), echo)
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, echo: bool) -> Self {
        Self { out, echo }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}").and_then(|_| self.out.flush()) {
            warn!("console write failed: {e}");
        }
    }
}

fn click_text(cue: &ClickCue) -> &'static str {
    match (cue.count_in, cue.accent) {
        (true, true) => "COUNT",
        (true, false) => "count",
        (false, true) => "TICK",
        (false, false) => "tick",
    }
}

fn feedback_text(event: &FeedbackEvent) -> String {
    match (event.onset, event.offset_us) {
        (Some(onset), Some(offset_us)) => format!(
            "{} #{onset} ({:+.0}ms)",
            event.tier.label(),
            offset_us as f64 / 1000.0
        ),
        (Some(onset), None) => format!("{} #{onset}", event.tier.label()),
        _ => format!("{} (stray tap)", FeedbackTier::Miss.label()),
    }
}

impl<W: Write> CueSink for ConsoleSink<W> {
    fn click(&mut self, cue: ClickCue) -> bool {
        if self.echo {
            self.line(click_text(&cue));
        } else {
            trace!("{:?} click {} {}", cue.pass, cue.index, click_text(&cue));
        }
        true
    }

    fn pulse(&mut self, cue: MarkerCue) -> bool {
        trace!("{:?} marker {}", cue.pass, cue.index);
        true
    }

    fn scoring_start(&mut self, trial_index: usize) -> bool {
        if self.echo {
            self.line(&format!("-- your turn (trial {}) --", trial_index + 1));
        }
        true
    }
}

impl<W: Write> FeedbackSink for ConsoleSink<W> {
    fn feedback(&mut self, event: FeedbackEvent) {
        let text = feedback_text(&event);
        if self.echo {
            self.line(&text);
        } else {
            debug!("{text}");
        }
    }
}

impl<W: Write> ResultSink for ConsoleSink<W> {
    fn trial_ended(&mut self, result: &TrialResult) {
        if self.echo {
            self.line(&format!(
                "trial {}: {} ({}/{} hit, avg {:.0}ms, {} early / {} late)",
                result.trial_index + 1,
                if result.success { "PASS" } else { "FAIL" },
                result.hits,
                result.onsets,
                result.average_error * 1000.0,
                result.early_taps,
                result.late_taps
            ));
        }
    }

    fn game_finished(&mut self, summary: &GameSummary) {
        if self.echo {
            self.line(&format!(
                "game over: {}/{} trials, mean error {:.0}ms",
                summary.correct_trials,
                summary.total_trials,
                summary.mean_error * 1000.0
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use earwise_types::PassKind;

    fn output(sink: ConsoleSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn echo_writes_lines() {
        let mut sink = ConsoleSink::new(Vec::new(), true);
        assert!(sink.click(ClickCue {
            pass: PassKind::Scoring,
            index: 0,
            accent: true,
            count_in: true,
        }));
        sink.feedback(FeedbackEvent::hit(FeedbackTier::Good, 2, -62_000));
        sink.feedback(FeedbackEvent::expired(3));
        sink.feedback(FeedbackEvent::stray());
        assert_eq!(
            output(sink),
            "COUNT\nGood #2 (-62ms)\nMiss #3\nMiss (stray tap)\n"
        );
    }

    #[test]
    fn quiet_mode_writes_nothing() {
        let mut sink = ConsoleSink::new(Vec::new(), false);
        sink.click(ClickCue {
            pass: PassKind::Preview,
            index: 1,
            accent: false,
            count_in: false,
        });
        sink.feedback(FeedbackEvent::stray());
        sink.game_finished(&GameSummary::from_trials(Vec::new()));
        assert!(output(sink).is_empty());
    }

    #[test]
    fn trial_line_reports_counts() {
        let mut sink = ConsoleSink::new(Vec::new(), true);
        sink.trial_ended(&TrialResult {
            trial_index: 0,
            success: true,
            average_error: 0.034,
            hit_ratio: 0.75,
            hits: 3,
            onsets: 4,
            early_taps: 1,
            late_taps: 0,
        });
        assert_eq!(
            output(sink),
            "trial 1: PASS (3/4 hit, avg 34ms, 1 early / 0 late)\n"
        );
    }
}
