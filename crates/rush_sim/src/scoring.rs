use crate::config::ScoringConfig;

/// Internal score accumulator for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreState {
    /// Never decreases within a run; never exceeds the configured maximum.
    /// Kept in f64 so per-frame increments are not lost on long runs.
    pub current: f64,
    pub collected_rings: u32,
}

/// What the UI is allowed to see. Refreshed on a throttled cadence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreSnapshot {
    pub score: u32,
    pub collected_rings: u32,
}

#[derive(Debug, Clone)]
pub struct ScoringEngine {
    config: ScoringConfig,
    state: ScoreState,
    visible: ScoreSnapshot,
    since_publish: f32,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config,
            state: ScoreState::default(),
            visible: ScoreSnapshot::default(),
            since_publish: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.state = ScoreState::default();
        self.visible = ScoreSnapshot::default();
        self.since_publish = 0.0;
    }

    pub fn state(&self) -> ScoreState {
        self.state
    }

    pub fn visible(&self) -> ScoreSnapshot {
        self.visible
    }

    /// Continuous component: distance flown this frame.
    pub fn accrue_distance(&mut self, speed: f32, delta: f32) {
        let gained = (f64::from(speed) * self.config.distance_factor * f64::from(delta)).max(0.0);
        self.add(gained);
    }

    /// Discrete component: one ring collected.
    pub fn collect_ring(&mut self) {
        self.state.collected_rings += 1;
        self.add(self.config.ring_bonus);
    }

    fn add(&mut self, amount: f64) {
        self.state.current = (self.state.current + amount).min(self.config.max_score);
    }

    /// Advance the publish timer and refresh the visible snapshot once more
    /// than `publish_interval` has passed. Returns the snapshot when it changed.
    pub fn tick_publish(&mut self, delta: f32) -> Option<ScoreSnapshot> {
        self.since_publish += delta;
        if self.since_publish <= self.config.publish_interval {
            return None;
        }
        self.since_publish = 0.0;
        self.publish()
    }

    /// Refresh the visible snapshot immediately.
    pub fn publish(&mut self) -> Option<ScoreSnapshot> {
        let next = ScoreSnapshot {
            score: clamp_score(self.state.current, self.config.max_score),
            collected_rings: self.state.collected_rings,
        };
        if next == self.visible {
            return None;
        }
        self.visible = next;
        Some(next)
    }

    /// Rounded and clamped value handed to the leaderboard.
    pub fn final_score(&self) -> u32 {
        clamp_score(self.state.current, self.config.max_score)
    }

    #[cfg(test)]
    pub(crate) fn set_current(&mut self, value: f64) {
        self.state.current = value;
    }
}

/// Round to the nearest integer and clamp into `[0, max_score]`. Non-finite
/// input maps to 0.
pub fn clamp_score(value: f64, max_score: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(0.0, max_score.max(0.0).floor()) as u32
}
