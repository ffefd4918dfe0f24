//! Mutable playback state, owned by one scheduler for one session.

use std::collections::HashMap;
use std::time::Duration;

/// Milliseconds in one minute.
const MS_PER_MINUTE: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    /// Index of the next action; playback is done once it reaches the end.
    pub cursor: usize,
    pub tempo_bpm: u32,
    /// Beats still to sit out before the next action runs.
    pub rest_remaining: u32,
    /// Repeats taken so far by each `GOTO`, keyed by its source line.
    pub goto_counts: HashMap<usize, u32>,
}

impl PlaybackState {
    pub fn new(tempo_bpm: u32) -> Self {
        Self {
            cursor: 0,
            tempo_bpm,
            rest_remaining: 0,
            goto_counts: HashMap::new(),
        }
    }

    /// Duration of one beat: `60000 / tempo_bpm` whole milliseconds.
    pub fn beat_interval(&self) -> Duration {
        Duration::from_millis(MS_PER_MINUTE / u64::from(self.tempo_bpm.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state() {
        let state = PlaybackState::new(120);
        assert_eq!(state.cursor, 0);
        assert_eq!(state.rest_remaining, 0);
        assert!(state.goto_counts.is_empty());
    }

    #[test]
    fn beat_interval_at_common_tempos() {
        assert_eq!(PlaybackState::new(60).beat_interval(), Duration::from_millis(1000));
        assert_eq!(PlaybackState::new(120).beat_interval(), Duration::from_millis(500));
        assert_eq!(PlaybackState::new(240).beat_interval(), Duration::from_millis(250));
    }

    #[test]
    fn beat_interval_truncates() {
        // 60000 / 7 = 8571.43
        assert_eq!(PlaybackState::new(7).beat_interval(), Duration::from_millis(8571));
    }
}
