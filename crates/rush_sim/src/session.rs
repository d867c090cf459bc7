//! Game state machine and the per-frame simulation step.
//!
//! A `Session` owns every piece of per-run state: craft, pools, score, camera
//! and the submission handle. The host drives it with `step(delta, input)`
//! once per rendered frame and reads transforms back through the accessors.
//!
//! Phases: `Loading -> Ready -> Playing -> GameOver -> Ready -> ...`
//!
//! Frame order while playing:
//!   1. integrate the craft pose
//!   2. drift and recycle craft-anchored pools (clouds, obstacles, rings)
//!   3. obstacle collision
//!   4. ring pickup, score accrual and throttled publish, skipped on a crash
//!      so the submitted score is the one standing at the hit
//!   5. chase camera
//!   6. drift and recycle camera-anchored wind streaks
//!
//! A step validates its delta before touching anything and then runs to
//! completion; there is no early return half way through a frame.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;

use crate::asset::CraftVisual;
use crate::camera::ChaseCamera;
use crate::collision::{obstacle_hits, within_pickup, CollisionProxy, Obb};
use crate::config::SimConfig;
use crate::pool::{Anchor, Ring, WorldPools};
use crate::pose::{Craft, FlightInput};
use crate::scoring::{ScoreSnapshot, ScoreState, ScoringEngine};
use crate::submit::{ScoreSink, ScoreSubmission, ScoreSubmitter, SubmitStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Loading,
    Ready,
    Playing,
    GameOver,
}

impl GamePhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::GameOver => "gameover",
        }
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Fire-and-forget notifications produced by a step. Audio and UI hooks
/// consume these; nothing is returned to the simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    RingCollected { ring: usize, total: u32 },
    Crashed { obstacles: Vec<usize> },
    ScorePublished(ScoreSnapshot),
    GameOver { final_score: u32 },
    SubmitFinished(SubmitStatus),
}

pub struct Session {
    config: SimConfig,
    phase: GamePhase,
    rng: StdRng,
    craft: Craft,
    proxy: CollisionProxy,
    visual: Option<CraftVisual>,
    pools: WorldPools,
    scoring: ScoringEngine,
    camera: ChaseCamera,
    run_time: f32,
    player_id: String,
    submitter: ScoreSubmitter,
    submitted: bool,
}

impl Session {
    /// Build the scene: pools are allocated and seeded here, once. The
    /// session waits in `Loading` until the craft visual is supplied.
    pub fn new(config: SimConfig, player_id: String, sink: Arc<dyn ScoreSink>) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let craft = Craft::new(config.flight.start_position());
        let camera = ChaseCamera::new(config.camera.clone());
        let craft_anchor = Anchor::new(craft.position, craft.rotation);
        let camera_anchor = camera.anchor(craft.axes().up);
        let pools = WorldPools::new(&config, &craft_anchor, &camera_anchor, &mut rng);
        log::debug!(
            "Pools allocated: {} obstacles, {} rings, {} clouds, {} wind streaks",
            pools.obstacles.len(),
            pools.rings.len(),
            pools.clouds.len(),
            pools.wind.len()
        );

        Self {
            proxy: CollisionProxy::from_config(&config.collision),
            scoring: ScoringEngine::new(config.scoring.clone()),
            config,
            phase: GamePhase::Loading,
            rng,
            craft,
            visual: None,
            pools,
            camera,
            run_time: 0.0,
            player_id,
            submitter: ScoreSubmitter::new(sink),
            submitted: false,
        }
    }

    /// `Loading -> Ready` once the craft has something to show, mesh or
    /// placeholder.
    pub fn craft_ready(&mut self, visual: CraftVisual) -> bool {
        if self.phase != GamePhase::Loading {
            log::debug!("craft_ready ignored in phase {}", self.phase);
            return false;
        }
        log::info!("Craft ready ({})", visual.label());
        self.visual = Some(visual);
        self.set_phase(GamePhase::Ready);
        true
    }

    /// `Ready -> Playing`. Any other phase is a no-op.
    pub fn start(&mut self) -> bool {
        if self.phase != GamePhase::Ready {
            log::debug!("start ignored in phase {}", self.phase);
            return false;
        }
        self.reset_run();
        self.set_phase(GamePhase::Playing);
        true
    }

    /// `GameOver -> Ready`. Rebuilds all per-run state, pools included. The
    /// craft visual is kept, so the session skips straight past `Loading`.
    pub fn restart(&mut self) -> bool {
        if self.phase != GamePhase::GameOver {
            log::debug!("restart ignored in phase {}", self.phase);
            return false;
        }
        self.reset_run();
        self.submitter.reset();
        let craft_anchor = Anchor::new(self.craft.position, self.craft.rotation);
        let camera_anchor = self.camera.anchor(self.craft.axes().up);
        self.pools
            .reseed(&self.config, &craft_anchor, &camera_anchor, &mut self.rng);
        self.set_phase(if self.visual.is_some() {
            GamePhase::Ready
        } else {
            GamePhase::Loading
        });
        true
    }

    fn reset_run(&mut self) {
        self.craft.reset(self.config.flight.start_position());
        self.camera.reset();
        self.scoring.reset();
        self.run_time = 0.0;
        self.submitted = false;
    }

    fn set_phase(&mut self, next: GamePhase) {
        log::info!("Phase {} -> {}", self.phase, next);
        self.phase = next;
    }

    /// Advance one rendered frame. Outside `Playing` only the pending score
    /// submission is polled.
    pub fn step(&mut self, delta: f32, input: &FlightInput) -> Vec<SimEvent> {
        let mut events = Vec::new();

        if !delta.is_finite() || delta <= 0.0 {
            log::warn!("Ignoring frame with invalid delta {delta}");
            return events;
        }
        let delta = if delta > self.config.max_frame_delta {
            log::warn!(
                "Frame delta {:.1}ms capped to {:.1}ms",
                delta * 1000.0,
                self.config.max_frame_delta * 1000.0
            );
            self.config.max_frame_delta
        } else {
            delta
        };

        if self.phase == GamePhase::Playing {
            self.simulate(delta, input, &mut events);
        }

        let was_pending = self.submitter.status().is_pending();
        let status = self.submitter.poll();
        if was_pending && !status.is_pending() {
            events.push(SimEvent::SubmitFinished(status.clone()));
        }

        events
    }

    fn simulate(&mut self, delta: f32, input: &FlightInput, events: &mut Vec<SimEvent>) {
        self.run_time += delta;
        let now = self.run_time;

        let speed = self.craft.integrate(input, delta, &self.config.flight);
        let craft_anchor = Anchor::new(self.craft.position, self.craft.rotation);

        let counts = self.pools.update_craft_relative(
            &self.config,
            &craft_anchor,
            speed,
            delta,
            now,
            &mut self.rng,
        );
        if counts.obstacles + counts.rings + counts.clouds > 0 {
            log::trace!("Recycled {counts:?}");
        }

        let proxy_box = self.proxy_box();
        let hits = obstacle_hits(&proxy_box, self.pools.obstacles.as_slice());
        let crashed = !hits.is_empty() && now > self.config.collision.safe_time;

        // The final score is the one standing when the hit happened.
        if !crashed {
            self.collect_rings(proxy_box.center, now, events);
            self.scoring.accrue_distance(speed, delta);
            if let Some(snapshot) = self.scoring.tick_publish(delta) {
                events.push(SimEvent::ScorePublished(snapshot));
            }
        }

        let axes = self.craft.axes();
        self.camera.follow(self.craft.position, &axes);
        let camera_anchor = self.camera.anchor(axes.up);
        self.pools
            .update_wind(&self.config.wind, &camera_anchor, speed, delta, &mut self.rng);

        if crashed {
            events.push(SimEvent::Crashed { obstacles: hits });
            self.end_run(events);
        }
    }

    fn collect_rings(&mut self, proxy_center: Vec3, now: f32, events: &mut Vec<SimEvent>) {
        let radius = self.config.collision.pickup_radius;
        let delay = self.config.rings.respawn_delay;
        for (index, ring) in self.pools.rings.as_mut_slice().iter_mut().enumerate() {
            if !ring.is_eligible(now) || !within_pickup(ring, proxy_center, radius) {
                continue;
            }
            ring.collect(now, delay);
            self.scoring.collect_ring();
            events.push(SimEvent::RingCollected {
                ring: index,
                total: self.scoring.state().collected_rings,
            });
        }
    }

    /// `Playing -> GameOver`: freeze the run and hand the final score to the
    /// sink, once.
    fn end_run(&mut self, events: &mut Vec<SimEvent>) {
        self.set_phase(GamePhase::GameOver);
        if let Some(snapshot) = self.scoring.publish() {
            events.push(SimEvent::ScorePublished(snapshot));
        }
        let final_score = self.scoring.final_score();
        log::info!(
            "Run over after {:.1}s: score {}, rings {}",
            self.run_time,
            final_score,
            self.scoring.state().collected_rings
        );
        events.push(SimEvent::GameOver { final_score });

        if self.submitted {
            return;
        }
        self.submitted = true;
        self.submitter.submit(ScoreSubmission {
            anon_id: self.player_id.clone(),
            score: final_score,
        });
    }

    /// Stop the session for good. Waits up to `timeout` for an in-flight
    /// submission, then drops pools and craft.
    pub fn teardown(mut self, timeout: Duration) -> SubmitStatus {
        self.submitter.settle(timeout).clone()
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn craft(&self) -> &Craft {
        &self.craft
    }

    pub fn visual(&self) -> Option<&CraftVisual> {
        self.visual.as_ref()
    }

    pub fn proxy_box(&self) -> Obb {
        self.proxy
            .world_box(self.craft.position, self.craft.rotation)
    }

    pub fn pools(&self) -> &WorldPools {
        &self.pools
    }

    pub fn live_rings(&self) -> impl Iterator<Item = &Ring> {
        self.pools.live_rings(self.run_time)
    }

    pub fn camera(&self) -> &ChaseCamera {
        &self.camera
    }

    pub fn score(&self) -> ScoreState {
        self.scoring.state()
    }

    pub fn visible_score(&self) -> ScoreSnapshot {
        self.scoring.visible()
    }

    pub fn final_score(&self) -> u32 {
        self.scoring.final_score()
    }

    pub fn run_time(&self) -> f32 {
        self.run_time
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn submit_status(&self) -> &SubmitStatus {
        self.submitter.status()
    }

    /// Block until the pending submission resolves or `timeout` passes.
    pub fn settle_submission(&mut self, timeout: Duration) -> &SubmitStatus {
        self.submitter.settle(timeout)
    }
}
