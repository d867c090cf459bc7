//! Craft pose integration.
//!
//! Orientation is never integrated directly. The integrator keeps three
//! bounded angles (pitch, yaw, bank) plus two smoothed control signals, and
//! rebuilds the orientation quaternion from the angles every frame. Nothing
//! multiplies quaternions across frames, so there is no normalization drift
//! no matter how long a run lasts.

use glam::{EulerRot, Quat, Vec3};
use std::f32::consts::{PI, TAU};
use rush_core::input::{InputState, Key};

use crate::config::FlightConfig;

const TURN_RIGHT_KEYS: &[Key] = &[Key::Right, Key::D, Key::E];
const TURN_LEFT_KEYS: &[Key] = &[Key::Left, Key::A, Key::Q];
const PITCH_DOWN_KEYS: &[Key] = &[Key::Down, Key::S];
const PITCH_UP_KEYS: &[Key] = &[Key::Up, Key::W];

/// Logical flight actions for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlightInput {
    pub turn_left: bool,
    pub turn_right: bool,
    pub pitch_up: bool,
    pub pitch_down: bool,
    pub boost: bool,
}

impl FlightInput {
    pub fn from_input_state(input: &InputState) -> Self {
        Self {
            turn_left: input.any_held(TURN_LEFT_KEYS),
            turn_right: input.any_held(TURN_RIGHT_KEYS),
            pitch_up: input.any_held(PITCH_UP_KEYS),
            pitch_down: input.any_held(PITCH_DOWN_KEYS),
            boost: input.is_held(Key::Shift),
        }
    }

    /// Raw turn signal in {-1, 0, 1}, right positive.
    pub fn turn_axis(&self) -> f32 {
        axis(self.turn_right, self.turn_left)
    }

    /// Raw pitch signal in {-1, 0, 1}, nose-down positive.
    pub fn pitch_axis(&self) -> f32 {
        axis(self.pitch_down, self.pitch_up)
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    f32::from(u8::from(positive)) - f32::from(u8::from(negative))
}

/// Smoothed control signals and the attitude angles derived from them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlState {
    /// Smoothed turn signal in [-1, 1].
    pub turn: f32,
    /// Smoothed pitch signal in [-1, 1].
    pub pitch_signal: f32,
    /// Pitch angle, clamped to ±max_pitch.
    pub pitch: f32,
    /// Heading angle, wrapped into [-PI, PI).
    pub yaw: f32,
    /// Roll angle, smoothed toward -turn * max_bank.
    pub bank: f32,
}

/// Local axes of an oriented frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axes {
    pub forward: Vec3,
    pub up: Vec3,
    pub right: Vec3,
}

impl Axes {
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            forward: (rotation * Vec3::Z).normalize(),
            up: (rotation * Vec3::Y).normalize(),
            right: (rotation * Vec3::X).normalize(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Craft {
    pub position: Vec3,
    pub rotation: Quat,
    pub controls: ControlState,
    /// Speed applied during the last integration step.
    pub speed: f32,
}

impl Craft {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            controls: ControlState::default(),
            speed: 0.0,
        }
    }

    pub fn reset(&mut self, position: Vec3) {
        *self = Self::new(position);
    }

    pub fn axes(&self) -> Axes {
        Axes::from_rotation(self.rotation)
    }

    /// Advance the craft by one frame and return the speed that was used.
    pub fn integrate(&mut self, input: &FlightInput, delta: f32, config: &FlightConfig) -> f32 {
        let c = &mut self.controls;

        let input_step = (config.input_smoothing * delta).clamp(0.0, 1.0);
        c.turn = lerp(c.turn, input.turn_axis(), input_step);
        c.pitch_signal = lerp(c.pitch_signal, input.pitch_axis(), input_step);

        let bank_step = (config.roll_rate * delta).clamp(0.0, 1.0);
        let target_bank = -c.turn * config.max_bank;
        c.bank = lerp(c.bank, target_bank, bank_step);

        c.pitch = (c.pitch + c.pitch_signal * config.pitch_rate * delta)
            .clamp(-config.max_pitch, config.max_pitch);

        // Bank feeds a coordinated-turn component on top of direct turn input.
        c.yaw += (c.turn * config.yaw_rate * config.coordination_factor
            - c.bank * config.banked_yaw_factor)
            * delta;
        c.yaw = wrap_angle(c.yaw);

        self.rotation = Quat::from_euler(EulerRot::YXZ, c.yaw, c.pitch, c.bank).normalize();

        self.speed = if input.boost {
            config.boost_speed
        } else {
            config.cruise_speed
        };
        self.position += self.axes().forward * (self.speed * delta);
        self.speed
    }
}

fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}
