use log::trace;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Instant;

/// Trait for types that can be interpolated.
pub trait Interpolatable: Sized + Clone {
    fn interpolate(&self, target: &Self, t: f64) -> Self;
}

impl Interpolatable for f32 {
    fn interpolate(&self, target: &Self, t: f64) -> Self {
        self + (target - self) * t as f32
    }
}

impl Interpolatable for f64 {
    fn interpolate(&self, target: &Self, t: f64) -> Self {
        self + (target - self) * t
    }
}

pub fn linear(t: f64) -> f64 {
    t
}

pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - 4.0 * (1.0 - t) * (1.0 - t) * (1.0 - t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    #[default]
    EaseInOutCubic,
}

impl Easing {
    pub fn as_fn(&self) -> fn(f64) -> f64 {
        match self {
            Easing::Linear => linear,
            Easing::EaseInOutCubic => ease_in_out_cubic,
        }
    }
}

#[derive(Debug)]
pub struct Animator<T>
where
    T: Interpolatable,
{
    pub from: T,
    pub to: T,
    pub duration: u32,
    pub start_time: Option<Instant>,
    pub ease_fn: fn(f64) -> f64,
    pub animating: bool,
    pub last_value: T,
    frame_times: VecDeque<Instant>,
}

impl<T> Animator<T>
where
    T: Interpolatable,
{
    pub fn new(from: T, to: T, ease_fn: fn(f64) -> f64) -> Self {
        Self {
            from: from.clone(),
            to,
            duration: 0,
            start_time: None,
            ease_fn,
            animating: false,
            last_value: from,
            frame_times: VecDeque::with_capacity(60),
        }
    }

    pub fn start_from(&mut self, from: T, to: T, duration: u32) {
        self.start_from_at(from, to, duration, Instant::now());
    }

    pub fn start_from_at(&mut self, from: T, to: T, duration: u32, now: Instant) {
        self.from = from.clone();
        self.to = to;
        self.duration = duration;
        self.start_time = Some(now);
        self.animating = true;
        self.last_value = from;
        self.frame_times.clear();
    }

    /// Returns Some(new_value) if animating, None if finished
    pub fn update(&mut self) -> Option<T> {
        self.update_at(Instant::now())
    }

    pub fn update_at(&mut self, now: Instant) -> Option<T> {
        if !self.animating {
            return None;
        }

        self.frame_times.push_back(now);
        if self.frame_times.len() > 60 {
            self.frame_times.pop_front();
        }

        let Some(start) = self.start_time.filter(|_| self.duration > 0) else {
            self.animating = false;
            self.last_value = self.to.clone();
            return Some(self.to.clone());
        };

        let elapsed = now.saturating_duration_since(start).as_millis() as f64;
        let mut t = (elapsed / (self.duration as f64)).clamp(0.0, 1.0);
        if t >= 1.0 {
            t = 1.0;
            self.animating = false;
            self.log_fps();
        }
        let eased_t = (self.ease_fn)(t);
        let value = self.from.interpolate(&self.to, eased_t);
        self.last_value = value.clone();
        Some(value)
    }

    fn log_fps(&self) {
        let (Some(first), Some(last)) = (self.frame_times.front(), self.frame_times.back()) else {
            return;
        };
        let total = last.saturating_duration_since(*first).as_secs_f64();
        if self.frame_times.len() < 2 || total <= 0.0 {
            return;
        }
        let fps = (self.frame_times.len() as f64 - 1.0) / total;
        trace!("Animation completed with average FPS: {:.1}", fps);
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn current_value(&self) -> &T {
        &self.last_value
    }
}
