use serde::Serialize;

use crate::config::GameSettings;

/// Scoring and leveling parameters copied out of [`GameSettings`].
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScoringRules {
    score_per_line: u64,
    score_per_hard_drop_block: u64,
    score_per_soft_drop_block: u64,
    level_up_line_count: u64,
    level_up_speed_multiplier: f64,
}

/// Game statistics: score, level, cleared lines and gravity speed.
///
/// Tracks various metrics during a game:
///
/// - **Score**: line clears plus soft/hard drop bonuses
/// - **Level**: starts at 1; one level per `levelUpLineCount` lines
/// - **Fall interval**: gravity period, multiplied on every level-up
/// - **Completed pieces**: total number of pieces locked
/// - **Line clear distribution**: how many locks cleared 0, 1, 2, ... lines
///
/// # Scoring
///
/// A lock clearing `n` lines is worth `n * scorePerLine * level`, using the
/// level in effect before the lines are counted. There are no combo,
/// back-to-back or T-spin bonuses. The score saturates at `u64::MAX`.
///
/// # Example
///
/// ```
/// use stackfall_engine::{GameConfig, GameStats};
///
/// let config = GameConfig::builtin();
/// let mut stats = GameStats::new(&config.game_settings);
/// stats.record_lock(2);
///
/// assert_eq!(stats.score(), 200);
/// assert_eq!(stats.lines(), 2);
/// assert_eq!(stats.line_cleared_counter()[2], 1);
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    #[serde(skip)]
    rules: ScoringRules,
    score: u64,
    level: u64,
    lines: u64,
    fall_interval_ms: f64,
    completed_pieces: u64,
    line_cleared_counter: Vec<u64>,
}

impl GameStats {
    /// Creates statistics for a fresh game: level 1, no score, initial gravity.
    #[must_use]
    pub fn new(settings: &GameSettings) -> Self {
        Self {
            rules: ScoringRules {
                score_per_line: settings.score_per_line,
                score_per_hard_drop_block: settings.score_per_hard_drop_block,
                score_per_soft_drop_block: settings.score_per_soft_drop_block,
                level_up_line_count: u64::from(settings.level_up_line_count),
                level_up_speed_multiplier: settings.level_up_speed_multiplier,
            },
            score: 0,
            level: 1,
            lines: 0,
            fall_interval_ms: settings.initial_fall_speed,
            completed_pieces: 0,
            line_cleared_counter: vec![0; 5],
        }
    }

    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    #[must_use]
    pub const fn level(&self) -> u64 {
        self.level
    }

    /// Total number of lines cleared.
    #[must_use]
    pub const fn lines(&self) -> u64 {
        self.lines
    }

    /// Current gravity period in milliseconds.
    #[must_use]
    pub const fn fall_interval_ms(&self) -> f64 {
        self.fall_interval_ms
    }

    #[must_use]
    pub const fn completed_pieces(&self) -> u64 {
        self.completed_pieces
    }

    /// Returns a histogram of locks by number of lines cleared.
    ///
    /// Index `n` counts the locks that cleared exactly `n` lines. The histogram
    /// covers at least `0..=4` and grows for taller pieces.
    #[must_use]
    pub fn line_cleared_counter(&self) -> &[u64] {
        &self.line_cleared_counter
    }

    /// Updates the statistics after a piece locks and `cleared_lines` rows are removed.
    ///
    /// Returns the number of levels gained.
    pub fn record_lock(&mut self, cleared_lines: usize) -> u64 {
        self.completed_pieces += 1;
        if cleared_lines >= self.line_cleared_counter.len() {
            self.line_cleared_counter.resize(cleared_lines + 1, 0);
        }
        self.line_cleared_counter[cleared_lines] += 1;

        let cleared = cleared_lines as u64;
        let points = cleared
            .saturating_mul(self.rules.score_per_line)
            .saturating_mul(self.level);
        self.score = self.score.saturating_add(points);
        self.lines += cleared;

        let mut gained = 0;
        while self.lines >= self.level.saturating_mul(self.rules.level_up_line_count) {
            self.level += 1;
            self.fall_interval_ms *= self.rules.level_up_speed_multiplier;
            gained += 1;
        }
        gained
    }

    /// Awards the bonus for one successful soft-drop step.
    pub fn add_soft_drop(&mut self) {
        self.score = self.score.saturating_add(self.rules.score_per_soft_drop_block);
    }

    /// Awards the bonus for a hard drop that moved the piece down `rows` rows.
    pub fn add_hard_drop(&mut self, rows: u32) {
        let points = u64::from(rows).saturating_mul(self.rules.score_per_hard_drop_block);
        self.score = self.score.saturating_add(points);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameConfig;

    fn stats() -> GameStats {
        GameStats::new(&GameConfig::builtin().game_settings)
    }

    fn assert_interval(stats: &GameStats, expected: f64) {
        assert!(
            (stats.fall_interval_ms() - expected).abs() < 1e-9,
            "fall interval {} != {expected}",
            stats.fall_interval_ms()
        );
    }

    #[test]
    fn test_initial_stats() {
        let stats = stats();
        assert_eq!(stats.score(), 0);
        assert_eq!(stats.level(), 1);
        assert_eq!(stats.lines(), 0);
        assert_eq!(stats.completed_pieces(), 0);
        assert_interval(&stats, 1000.0);
    }

    #[test]
    fn test_line_clear_scoring_at_level_one() {
        let mut stats = stats();
        stats.record_lock(1);
        assert_eq!(stats.score(), 100);
        stats.record_lock(2);
        assert_eq!(stats.score(), 300);
        stats.record_lock(0);
        assert_eq!(stats.score(), 300);
        assert_eq!(stats.completed_pieces(), 3);
        assert_eq!(stats.line_cleared_counter(), [1, 1, 1, 0, 0]);
    }

    #[test]
    fn test_level_up_every_ten_lines() {
        let mut stats = stats();
        for _ in 0..2 {
            stats.record_lock(4);
        }
        assert_eq!(stats.level(), 1);
        assert_eq!(stats.record_lock(2), 1);
        assert_eq!(stats.lines(), 10);
        assert_eq!(stats.level(), 2);
        assert_interval(&stats, 900.0);

        for _ in 0..2 {
            stats.record_lock(4);
        }
        assert_eq!(stats.record_lock(2), 1);
        assert_eq!(stats.lines(), 20);
        assert_eq!(stats.level(), 3);
        assert_interval(&stats, 810.0);
    }

    #[test]
    fn test_clear_uses_level_before_counting() {
        let mut stats = stats();
        for _ in 0..9 {
            stats.record_lock(1);
        }
        assert_eq!(stats.score(), 900);
        // The 10th line is still scored at level 1.
        stats.record_lock(1);
        assert_eq!(stats.score(), 1000);
        assert_eq!(stats.level(), 2);
        stats.record_lock(1);
        assert_eq!(stats.score(), 1200);
    }

    #[test]
    fn test_multiple_levels_at_once() {
        let mut config = GameConfig::builtin();
        config.game_settings.level_up_line_count = 1;
        config.game_settings.level_up_speed_multiplier = 0.5;
        let mut stats = GameStats::new(&config.game_settings);
        assert_eq!(stats.record_lock(3), 3);
        assert_eq!(stats.level(), 4);
        assert_interval(&stats, 125.0);
    }

    #[test]
    fn test_drop_bonuses() {
        let mut stats = stats();
        stats.add_soft_drop();
        stats.add_soft_drop();
        assert_eq!(stats.score(), 2);
        stats.add_hard_drop(15);
        assert_eq!(stats.score(), 32);
        stats.add_hard_drop(0);
        assert_eq!(stats.score(), 32);
    }

    #[test]
    fn test_score_saturates() {
        let mut config = GameConfig::builtin();
        config.game_settings.score_per_line = u64::MAX / 2;
        config.game_settings.score_per_hard_drop_block = u64::MAX;
        let mut stats = GameStats::new(&config.game_settings);
        stats.record_lock(4);
        assert_eq!(stats.score(), u64::MAX);
        assert_eq!(stats.lines(), 4);
        stats.add_hard_drop(3);
        stats.add_soft_drop();
        assert_eq!(stats.score(), u64::MAX);
    }

    #[test]
    fn test_histogram_grows_for_tall_clears() {
        let mut stats = stats();
        stats.record_lock(6);
        assert_eq!(stats.line_cleared_counter().len(), 7);
        assert_eq!(stats.line_cleared_counter()[6], 1);
    }

    #[test]
    fn test_serialize_skips_rules() {
        let mut stats = stats();
        stats.record_lock(1);
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["score"], 100);
        assert_eq!(value["level"], 1);
        assert_eq!(value["lines"], 1);
        assert_eq!(value["completedPieces"], 1);
        assert!(value.get("rules").is_none());
    }
}
