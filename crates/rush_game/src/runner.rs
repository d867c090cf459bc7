//! Headless frame loop driving a `Session` from key input.
//!
//! Each frame the runner picks the held keys (from a replay or the built-in
//! autopilot), folds them into `InputState`, handles the one-shot actions
//! (Space/Enter start a run, R restarts after a crash, Escape stops the
//! runner), maps the rest to flight actions and steps the session.

use rush_core::input::{InputState, Key};
use rush_core::time::FrameClock;
use rush_sim::{FlightInput, GamePhase, Session, SimEvent, SubmitStatus};
use std::time::Duration;

const START_KEYS: &[Key] = &[Key::Space, Key::Enter];
const SUBMIT_SETTLE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub final_score: u32,
    pub collected_rings: u32,
    pub seconds: f32,
    pub status: SubmitStatus,
}

/// Where per-frame keys come from.
pub enum KeySource {
    Replay { frames: Vec<Vec<Key>>, cursor: usize },
    Autopilot,
}

impl KeySource {
    pub fn replay(frames: Vec<Vec<Key>>) -> Self {
        Self::Replay { frames, cursor: 0 }
    }

    /// Keys for the next frame, or `None` once a replay is exhausted.
    fn next(&mut self, phase: GamePhase, previous: &InputState) -> Option<Vec<Key>> {
        match self {
            Self::Replay { frames, cursor } => {
                let keys = frames.get(*cursor).cloned();
                *cursor += 1;
                keys
            }
            Self::Autopilot => Some(autopilot_keys(phase, previous)),
        }
    }
}

/// Boost straight ahead, tapping Space/R to get through the menus. A key is
/// released for one frame before it is pressed again so edges register.
fn autopilot_keys(phase: GamePhase, previous: &InputState) -> Vec<Key> {
    let tap = |key: Key| {
        if previous.is_held(key) {
            Vec::new()
        } else {
            vec![key]
        }
    };
    match phase {
        GamePhase::Loading => Vec::new(),
        GamePhase::Ready => tap(Key::Space),
        GamePhase::Playing => vec![Key::Shift],
        GamePhase::GameOver => tap(Key::R),
    }
}

pub struct RunLimits {
    pub runs: u32,
    pub seconds_per_run: f32,
    pub fixed_dt: f32,
    pub realtime: bool,
}

pub struct Runner {
    session: Session,
    input: InputState,
    keys: KeySource,
    clock: FrameClock,
}

impl Runner {
    pub fn new(session: Session, keys: KeySource) -> Self {
        Self {
            session,
            input: InputState::new(),
            keys,
            clock: FrameClock::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Play until `limits.runs` runs have ended or the key source runs dry.
    /// A run that reaches the time limit without crashing is reported as is,
    /// unsubmitted.
    pub fn run(&mut self, limits: &RunLimits) -> Vec<RunSummary> {
        let mut summaries = Vec::new();
        let mut run_seconds = 0.0_f32;

        while (summaries.len() as u32) < limits.runs {
            let Some(keys) = self.keys.next(self.session.phase(), &self.input) else {
                log::info!("Replay finished");
                break;
            };
            self.input.apply_held(&keys);

            if self.input.is_just_pressed(Key::Escape) {
                log::info!("Escape pressed, stopping");
                break;
            }
            if self.session.phase() == GamePhase::GameOver
                && self.input.is_just_pressed(Key::R)
                && self.session.restart()
            {
                self.input.clear();
            }
            if START_KEYS.iter().any(|k| self.input.is_just_pressed(*k)) && self.session.start() {
                run_seconds = 0.0;
            }

            let delta = if limits.realtime {
                self.clock.begin_frame()
            } else {
                self.clock.advance(limits.fixed_dt)
            };
            let flight = FlightInput::from_input_state(&self.input);
            let events = self.session.step(delta, &flight);
            self.input.end_frame();

            let mut crashed = false;
            for event in &events {
                log_event(event);
                crashed |= matches!(event, SimEvent::GameOver { .. });
            }

            if self.session.phase() == GamePhase::Playing {
                run_seconds += delta;
            }
            if crashed {
                let status = self.session.settle_submission(SUBMIT_SETTLE).clone();
                summaries.push(self.summarize(status));
            } else if self.session.phase() == GamePhase::Playing
                && run_seconds >= limits.seconds_per_run
            {
                log::info!("Time limit reached after {:.1}s", run_seconds);
                summaries.push(self.summarize(SubmitStatus::Idle));
                break;
            }

            if limits.realtime {
                let wait = self.clock.time_until(limits.fixed_dt);
                if wait > 0.0 {
                    std::thread::sleep(Duration::from_secs_f32(wait));
                }
            }
        }

        log::info!(
            "Stopped after {} frames ({:.1}s simulated, {:.0} fps)",
            self.clock.frame_count,
            self.clock.total_time,
            self.clock.smoothed_fps
        );
        summaries
    }

    fn summarize(&self, status: SubmitStatus) -> RunSummary {
        let score = self.session.score();
        RunSummary {
            final_score: self.session.final_score(),
            collected_rings: score.collected_rings,
            seconds: self.session.run_time(),
            status,
        }
    }

    pub fn into_session(self) -> Session {
        self.session
    }
}

fn log_event(event: &SimEvent) {
    match event {
        SimEvent::RingCollected { ring, total } => {
            log::debug!("Ring {ring} collected ({total} total)")
        }
        SimEvent::Crashed { obstacles } => log::info!("Crashed into obstacles {obstacles:?}"),
        SimEvent::ScorePublished(snapshot) => {
            log::trace!("Score {} / rings {}", snapshot.score, snapshot.collected_rings)
        }
        SimEvent::GameOver { final_score } => log::info!("Game over, final score {final_score}"),
        SimEvent::SubmitFinished(status) => log::info!("Submission {status}"),
    }
}
