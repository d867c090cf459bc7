//! Tuning constants for a flight run.
//!
//! Every value here is empirical: the numbers were tuned by feel, not derived
//! from a flight model. They are grouped per subsystem and every field falls
//! back to its default, so a JSON override only needs the keys it changes.

use glam::Vec3;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Closed interval used for uniform draws.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn is_ordered(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimConfig {
    pub seed: u64,
    /// Deltas above this are capped before they reach the simulation.
    pub max_frame_delta: f32,
    pub flight: FlightConfig,
    pub obstacles: ObstacleConfig,
    pub rings: RingConfig,
    pub clouds: CloudConfig,
    pub wind: WindConfig,
    pub scoring: ScoringConfig,
    pub collision: CollisionConfig,
    pub camera: CameraConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed_f11e,
            max_frame_delta: 0.25,
            flight: FlightConfig::default(),
            obstacles: ObstacleConfig::default(),
            rings: RingConfig::default(),
            clouds: CloudConfig::default(),
            wind: WindConfig::default(),
            scoring: ScoringConfig::default(),
            collision: CollisionConfig::default(),
            camera: CameraConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FlightConfig {
    pub cruise_speed: f32,
    pub boost_speed: f32,
    pub yaw_rate: f32,
    /// Share of `yaw_rate` applied directly from turn input.
    pub coordination_factor: f32,
    pub pitch_rate: f32,
    /// Smoothing rate of bank toward its target.
    pub roll_rate: f32,
    pub max_bank: f32,
    /// Yaw contributed per radian of bank.
    pub banked_yaw_factor: f32,
    /// Smoothing rate of the raw turn/pitch signals.
    pub input_smoothing: f32,
    pub max_pitch: f32,
    pub start_position: [f32; 3],
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            cruise_speed: 14.0,
            boost_speed: 22.0,
            yaw_rate: 0.62,
            coordination_factor: 0.35,
            pitch_rate: 0.95,
            roll_rate: 1.35,
            max_bank: 0.38,
            banked_yaw_factor: 1.5,
            input_smoothing: 5.5,
            max_pitch: 0.4,
            start_position: [0.0, 3.0, 0.0],
        }
    }
}

impl FlightConfig {
    pub fn start_position(&self) -> Vec3 {
        Vec3::from_array(self.start_position)
    }
}

/// Where a pooled entity lands relative to its anchor frame:
/// `forward * ahead + right * ±lateral + up * (vertical_bias ± vertical)`.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Placement {
    pub ahead: Span,
    pub lateral: f32,
    pub vertical: f32,
    #[serde(default)]
    pub vertical_bias: f32,
}

impl Placement {
    /// Farthest distance from the anchor a spawn can land.
    pub fn max_reach(&self) -> f32 {
        let ahead = self.ahead.min.abs().max(self.ahead.max.abs());
        let vertical = self.vertical_bias.abs() + self.vertical.abs();
        Vec3::new(self.lateral.abs(), vertical, ahead).length()
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ObstacleConfig {
    pub count: usize,
    pub placement: Placement,
    pub respawn_distance: f32,
    /// Edge length range; each box axis is drawn independently.
    pub size: Span,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            count: 20,
            placement: Placement {
                ahead: Span::new(70.0, 190.0),
                lateral: 38.0,
                vertical: 24.0,
                vertical_bias: 0.0,
            },
            respawn_distance: 240.0,
            size: Span::new(1.0, 3.2),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RingConfig {
    pub count: usize,
    pub placement: Placement,
    pub respawn_distance: f32,
    /// Seconds a collected ring stays hidden before it respawns.
    pub respawn_delay: f32,
    pub spin_rate: f32,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            count: 10,
            placement: Placement {
                ahead: Span::new(55.0, 160.0),
                lateral: 26.0,
                vertical: 18.0,
                vertical_bias: 0.0,
            },
            respawn_distance: 240.0,
            respawn_delay: 2.0,
            spin_rate: 1.6,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CloudConfig {
    pub count: usize,
    /// Used for recycling during a run.
    pub near: Placement,
    /// Used for the initial seeding of the pool.
    pub far: Placement,
    pub respawn_distance: f32,
    pub base_size: Span,
    pub stretch_x: Span,
    pub squash_y: Span,
    pub drift_base: f32,
    pub drift_speed_factor: f32,
    pub spin_rate: f32,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            count: 34,
            near: Placement {
                ahead: Span::new(45.0, 225.0),
                lateral: 95.0,
                vertical: 54.0,
                vertical_bias: 12.0,
            },
            far: Placement {
                ahead: Span::new(180.0, 360.0),
                lateral: 95.0,
                vertical: 54.0,
                vertical_bias: 12.0,
            },
            respawn_distance: 360.0,
            base_size: Span::new(8.0, 16.0),
            stretch_x: Span::new(1.3, 2.5),
            squash_y: Span::new(0.38, 0.73),
            drift_base: 0.6,
            drift_speed_factor: 0.08,
            spin_rate: 0.04,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WindConfig {
    pub count: usize,
    /// Relative to the camera, not the craft.
    pub placement: Placement,
    /// Depth along the camera's forward axis a streak may occupy.
    pub depth_window: Span,
    pub respawn_distance: f32,
    pub length: Span,
    pub thickness: f32,
    pub drift_base: f32,
    pub drift_speed_factor: f32,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            count: 36,
            placement: Placement {
                ahead: Span::new(6.0, 22.0),
                lateral: 8.0,
                vertical: 4.5,
                vertical_bias: 0.0,
            },
            depth_window: Span::new(-2.0, 26.0),
            respawn_distance: 30.0,
            length: Span::new(1.2, 4.0),
            thickness: 0.018,
            drift_base: 10.0,
            drift_speed_factor: 2.4,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScoringConfig {
    pub distance_factor: f64,
    pub ring_bonus: f64,
    pub max_score: f64,
    /// Minimum simulated time between visible score updates.
    pub publish_interval: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            distance_factor: 0.08,
            ring_bonus: 10.0,
            max_score: 50_000.0,
            publish_interval: 0.1,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CollisionConfig {
    /// Seconds after run start during which obstacle hits are ignored.
    pub safe_time: f32,
    pub pickup_radius: f32,
    /// Full size of the placeholder box the craft collides with.
    pub proxy_size: [f32; 3],
    /// The proxy is shrunk below the visual size to cut false positives.
    pub proxy_scale: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            safe_time: 2.0,
            pickup_radius: 4.8,
            proxy_size: [1.6, 0.8, 2.6],
            proxy_scale: 0.72,
        }
    }
}

impl CollisionConfig {
    pub fn proxy_half_extents(&self) -> Vec3 {
        Vec3::from_array(self.proxy_size) * 0.5 * self.proxy_scale
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CameraConfig {
    pub follow_distance: f32,
    pub follow_height: f32,
    pub look_ahead: f32,
    /// Fraction of the remaining gap closed each frame.
    pub blend: f32,
    pub start_position: [f32; 3],
    pub start_target: [f32; 3],
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            follow_distance: 16.0,
            follow_height: 4.0,
            look_ahead: 10.0,
            blend: 0.1,
            start_position: [0.0, 3.0, -12.0],
            start_target: [0.0, 0.0, 0.0],
            fov_y: 0.8,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<SimConfig, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let config: SimConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &SimConfig) -> Result<(), String> {
    let flight = &config.flight;
    if !(flight.cruise_speed > 0.0 && flight.boost_speed > 0.0) {
        return Err("Config validation failed: speeds must be > 0".to_string());
    }
    if flight.max_pitch < 0.0 || flight.max_bank < 0.0 {
        return Err("Config validation failed: max_pitch and max_bank must be >= 0".to_string());
    }
    if !(config.max_frame_delta > 0.0) {
        return Err("Config validation failed: max_frame_delta must be > 0".to_string());
    }

    validate_placement("obstacles", &config.obstacles.placement, config.obstacles.respawn_distance)?;
    validate_span("obstacles.size", &config.obstacles.size)?;
    if config.obstacles.size.min <= 0.0 {
        return Err("Config validation failed: obstacles.size must be > 0".to_string());
    }
    validate_placement("rings", &config.rings.placement, config.rings.respawn_distance)?;
    if config.rings.respawn_delay < 0.0 {
        return Err("Config validation failed: rings.respawn_delay must be >= 0".to_string());
    }
    // Far seeding may land past the threshold; the first step pulls those in.
    validate_placement("clouds.near", &config.clouds.near, config.clouds.respawn_distance)?;
    validate_span("clouds.far.ahead", &config.clouds.far.ahead)?;
    validate_span("clouds.base_size", &config.clouds.base_size)?;
    validate_span("clouds.stretch_x", &config.clouds.stretch_x)?;
    validate_span("clouds.squash_y", &config.clouds.squash_y)?;
    validate_placement("wind", &config.wind.placement, config.wind.respawn_distance)?;
    validate_span("wind.depth_window", &config.wind.depth_window)?;
    validate_span("wind.length", &config.wind.length)?;
    let wind_ahead = config.wind.placement.ahead;
    if wind_ahead.min < config.wind.depth_window.min || wind_ahead.max > config.wind.depth_window.max
    {
        return Err(
            "Config validation failed: wind.placement.ahead must lie inside wind.depth_window"
                .to_string(),
        );
    }

    if !(config.scoring.max_score > 0.0) {
        return Err("Config validation failed: scoring.max_score must be > 0".to_string());
    }
    if config.scoring.ring_bonus < 0.0 || config.scoring.distance_factor < 0.0 {
        return Err("Config validation failed: score increments must be >= 0".to_string());
    }
    if config.collision.pickup_radius <= 0.0 || config.collision.proxy_scale <= 0.0 {
        return Err(
            "Config validation failed: pickup_radius and proxy_scale must be > 0".to_string(),
        );
    }
    if !(config.camera.blend > 0.0 && config.camera.blend <= 1.0) {
        return Err("Config validation failed: camera.blend must be in (0, 1]".to_string());
    }
    Ok(())
}

fn validate_span(name: &str, span: &Span) -> Result<(), String> {
    if !span.is_ordered() {
        return Err(format!(
            "Config validation failed: {name} must have min <= max (got {} > {})",
            span.min, span.max
        ));
    }
    Ok(())
}

fn validate_placement(name: &str, placement: &Placement, respawn_distance: f32) -> Result<(), String> {
    validate_span(&format!("{name}.ahead"), &placement.ahead)?;
    if placement.lateral < 0.0 || placement.vertical < 0.0 {
        return Err(format!(
            "Config validation failed: {name} lateral/vertical ranges must be >= 0"
        ));
    }
    if !(respawn_distance > 0.0) {
        return Err(format!(
            "Config validation failed: {name} respawn distance must be > 0"
        ));
    }
    // A spawn outside the threshold would be recycled forever.
    if placement.max_reach() > respawn_distance {
        return Err(format!(
            "Config validation failed: {name} spawn window reaches {:.1}, beyond respawn distance {respawn_distance}",
            placement.max_reach()
        ));
    }
    Ok(())
}
