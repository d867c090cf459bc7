//! Fixed-capacity entity pools that make the world look endless.
//!
//! Each category (obstacles, rings, clouds, wind streaks) owns a `Pool`
//! allocated once when the session is built. Entities are never created or
//! dropped during a run. When one falls outside its category's relevance
//! radius it is moved back in front of its anchor by the shared placement
//! routine. Per-frame cost is O(pool size) and memory stays bounded.
//!
//! Obstacles, rings and clouds are anchored on the craft. Wind streaks are
//! anchored on the camera and run after the camera update, so they are
//! checked against the pose the renderer will actually use.

use glam::{EulerRot, Quat, Vec3};
use rand::Rng;
use std::f32::consts::PI;

use crate::config::{CloudConfig, ObstacleConfig, Placement, RingConfig, SimConfig, Span, WindConfig};
use crate::pose::Axes;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Origin and axes that spawns are placed relative to.
#[derive(Debug, Clone, Copy)]
pub struct Anchor {
    pub origin: Vec3,
    pub axes: Axes,
}

impl Anchor {
    pub fn new(origin: Vec3, rotation: Quat) -> Self {
        Self {
            origin,
            axes: Axes::from_rotation(rotation),
        }
    }
}

pub(crate) fn draw(rng: &mut impl Rng, span: Span) -> f32 {
    span.min + rng.gen::<f32>() * (span.max - span.min)
}

fn draw_symmetric(rng: &mut impl Rng, half_width: f32) -> f32 {
    (rng.gen::<f32>() * 2.0 - 1.0) * half_width
}

/// Shared respawn placement: a point ahead of the anchor, offset sideways
/// and vertically by uniform draws from the category's ranges.
pub fn place(placement: &Placement, anchor: &Anchor, rng: &mut impl Rng) -> Vec3 {
    let ahead = draw(rng, placement.ahead);
    let lateral = draw_symmetric(rng, placement.lateral);
    let vertical = placement.vertical_bias + draw_symmetric(rng, placement.vertical);
    anchor.origin + anchor.axes.forward * ahead + anchor.axes.right * lateral + anchor.axes.up * vertical
}

pub trait Pooled {
    fn transform(&self) -> &Transform;

    fn distance_squared_to(&self, point: Vec3) -> f32 {
        self.transform().translation.distance_squared(point)
    }
}

/// Fixed-size set of entities of one category.
#[derive(Debug, Clone)]
pub struct Pool<T> {
    entities: Vec<T>,
}

impl<T> Pool<T> {
    fn filled(count: usize, mut make: impl FnMut() -> T) -> Self {
        let mut entities = Vec::with_capacity(count);
        for _ in 0..count {
            entities.push(make());
        }
        Self { entities }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entities.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.entities
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.entities
    }
}

#[derive(Debug, Clone)]
pub struct Obstacle {
    pub transform: Transform,
    pub half_extents: Vec3,
}

impl Obstacle {
    fn spawn(&mut self, config: &ObstacleConfig, anchor: &Anchor, rng: &mut impl Rng) {
        self.transform.translation = place(&config.placement, anchor, rng);
    }
}

impl Pooled for Obstacle {
    fn transform(&self) -> &Transform {
        &self.transform
    }
}

#[derive(Debug, Clone)]
pub struct Ring {
    pub transform: Transform,
    pub enabled: bool,
    /// Run time at which a collected ring comes back.
    pub respawn_at: f32,
}

impl Ring {
    fn spawn(&mut self, config: &RingConfig, anchor: &Anchor, rng: &mut impl Rng) {
        self.transform.translation = place(&config.placement, anchor, rng);
        self.transform.rotation =
            Quat::from_euler(EulerRot::YXZ, rng.gen::<f32>() * PI, rng.gen::<f32>() * PI, 0.0);
        self.enabled = true;
    }

    pub fn collect(&mut self, now: f32, delay: f32) {
        self.enabled = false;
        self.respawn_at = now + delay;
    }

    /// Whether the ring can be picked up at `now`. A collected ring stays
    /// ineligible until its respawn time, when the pool update brings it back.
    pub fn is_eligible(&self, now: f32) -> bool {
        self.enabled && self.respawn_at <= now
    }
}

impl Pooled for Ring {
    fn transform(&self) -> &Transform {
        &self.transform
    }
}

#[derive(Debug, Clone)]
pub struct Cloud {
    pub transform: Transform,
    /// Euler angles (x, y, z); y keeps turning slowly.
    pub euler: Vec3,
}

impl Cloud {
    fn spawn(&mut self, config: &CloudConfig, far: bool, anchor: &Anchor, rng: &mut impl Rng) {
        let placement = if far { &config.far } else { &config.near };
        self.transform.translation = place(placement, anchor, rng);
        let base = draw(rng, config.base_size);
        let stretch = draw(rng, config.stretch_x);
        let squash = draw(rng, config.squash_y);
        self.transform.scale = Vec3::new(base * stretch, base * squash, base);
        self.euler = Vec3::new(
            rng.gen::<f32>() * 0.3,
            rng.gen::<f32>() * PI,
            rng.gen::<f32>() * 0.2,
        );
        self.sync_rotation();
    }

    fn sync_rotation(&mut self) {
        self.transform.rotation =
            Quat::from_euler(EulerRot::YXZ, self.euler.y, self.euler.x, self.euler.z);
    }
}

impl Pooled for Cloud {
    fn transform(&self) -> &Transform {
        &self.transform
    }
}

#[derive(Debug, Clone)]
pub struct WindStreak {
    pub transform: Transform,
}

impl WindStreak {
    fn spawn(&mut self, config: &WindConfig, anchor: &Anchor, rng: &mut impl Rng) {
        self.transform.translation = place(&config.placement, anchor, rng);
        self.transform.scale = Vec3::new(config.thickness, config.thickness, draw(rng, config.length));
        self.transform.rotation = Quat::from_rotation_arc(Vec3::Z, anchor.axes.forward);
    }
}

impl Pooled for WindStreak {
    fn transform(&self) -> &Transform {
        &self.transform
    }
}

/// Respawn every entity farther than `threshold` from `anchor`. Returns how
/// many were moved.
fn recycle_beyond<T: Pooled>(
    entities: &mut [T],
    anchor: Vec3,
    threshold: f32,
    mut respawn: impl FnMut(&mut T),
) -> usize {
    let limit = threshold * threshold;
    let mut recycled = 0;
    for entity in entities.iter_mut() {
        if entity.distance_squared_to(anchor) > limit {
            respawn(entity);
            recycled += 1;
        }
    }
    recycled
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecycleCounts {
    pub obstacles: usize,
    pub rings: usize,
    pub clouds: usize,
    pub wind: usize,
}

/// All four pools of a session.
#[derive(Debug, Clone)]
pub struct WorldPools {
    pub obstacles: Pool<Obstacle>,
    pub rings: Pool<Ring>,
    pub clouds: Pool<Cloud>,
    pub wind: Pool<WindStreak>,
}

impl WorldPools {
    /// Allocate every pool at its configured capacity and seed it around the
    /// given anchors.
    pub fn new(config: &SimConfig, craft: &Anchor, camera: &Anchor, rng: &mut impl Rng) -> Self {
        let mut pools = Self {
            obstacles: Pool::filled(config.obstacles.count, || Obstacle {
                transform: Transform::default(),
                half_extents: Vec3::splat(0.5),
            }),
            rings: Pool::filled(config.rings.count, || Ring {
                transform: Transform::default(),
                enabled: true,
                respawn_at: 0.0,
            }),
            clouds: Pool::filled(config.clouds.count, || Cloud {
                transform: Transform::default(),
                euler: Vec3::ZERO,
            }),
            wind: Pool::filled(config.wind.count, || WindStreak {
                transform: Transform::default(),
            }),
        };
        pools.reseed(config, craft, camera, rng);
        pools
    }

    /// Re-place every entity in place, as at scene setup. Capacity is unchanged.
    pub fn reseed(&mut self, config: &SimConfig, craft: &Anchor, camera: &Anchor, rng: &mut impl Rng) {
        for obstacle in self.obstacles.as_mut_slice() {
            let size = Vec3::new(
                draw(rng, config.obstacles.size),
                draw(rng, config.obstacles.size),
                draw(rng, config.obstacles.size),
            );
            obstacle.half_extents = size * 0.5;
            obstacle.transform.scale = size;
            obstacle.spawn(&config.obstacles, craft, rng);
        }
        for ring in self.rings.as_mut_slice() {
            ring.respawn_at = 0.0;
            ring.spawn(&config.rings, craft, rng);
        }
        for cloud in self.clouds.as_mut_slice() {
            cloud.spawn(&config.clouds, true, craft, rng);
        }
        for streak in self.wind.as_mut_slice() {
            streak.spawn(&config.wind, camera, rng);
        }
    }

    /// Drift clouds, bring back expired rings, spin live rings and recycle
    /// every craft-anchored entity that fell out of range.
    pub fn update_craft_relative(
        &mut self,
        config: &SimConfig,
        craft: &Anchor,
        speed: f32,
        delta: f32,
        now: f32,
        rng: &mut impl Rng,
    ) -> RecycleCounts {
        let mut counts = RecycleCounts::default();

        let drift = config.clouds.drift_base + speed * config.clouds.drift_speed_factor;
        for cloud in self.clouds.as_mut_slice() {
            cloud.transform.translation -= craft.axes.forward * (drift * delta);
            cloud.euler.y += config.clouds.spin_rate * delta;
            cloud.sync_rotation();
        }
        counts.clouds = recycle_beyond(
            self.clouds.as_mut_slice(),
            craft.origin,
            config.clouds.respawn_distance,
            |cloud| cloud.spawn(&config.clouds, false, craft, rng),
        );

        counts.obstacles = recycle_beyond(
            self.obstacles.as_mut_slice(),
            craft.origin,
            config.obstacles.respawn_distance,
            |obstacle| obstacle.spawn(&config.obstacles, craft, rng),
        );

        let ring_limit = config.rings.respawn_distance * config.rings.respawn_distance;
        let spin = Quat::from_rotation_y(config.rings.spin_rate * delta);
        for ring in self.rings.as_mut_slice() {
            if ring.respawn_at > now {
                continue;
            }
            if !ring.enabled {
                ring.spawn(&config.rings, craft, rng);
                counts.rings += 1;
            }
            ring.transform.rotation = (ring.transform.rotation * spin).normalize();
            if ring.distance_squared_to(craft.origin) > ring_limit {
                ring.spawn(&config.rings, craft, rng);
                counts.rings += 1;
            }
        }

        counts
    }

    /// Drift wind streaks against the camera's view direction and recycle
    /// those that left the depth window or the camera's radius.
    pub fn update_wind(
        &mut self,
        config: &WindConfig,
        camera: &Anchor,
        speed: f32,
        delta: f32,
        rng: &mut impl Rng,
    ) -> usize {
        let forward = camera.axes.forward;
        let drift = config.drift_base + speed * config.drift_speed_factor;
        let limit = config.respawn_distance * config.respawn_distance;
        let mut recycled = 0;
        for streak in self.wind.as_mut_slice() {
            streak.transform.translation -= forward * (drift * delta);
            let offset = streak.transform.translation - camera.origin;
            let depth = offset.dot(forward);
            if depth < config.depth_window.min
                || depth > config.depth_window.max
                || offset.length_squared() > limit
            {
                streak.spawn(config, camera, rng);
                recycled += 1;
            }
        }
        recycled
    }

    /// Rings that are currently visible and collidable.
    pub fn live_rings(&self, now: f32) -> impl Iterator<Item = &Ring> {
        self.rings.iter().filter(move |ring| ring.is_eligible(now))
    }
}
