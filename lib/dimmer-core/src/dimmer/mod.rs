//! The dim coordinator.
//!
//! A [`Dimmer`] owns at most one dim surface for its host. Every frame is one pass:
//!
//! 1. [`Dimmer::reset_dim_states`] forgets the previous pass's requests,
//! 2. containers call [`Dimmer::adjust_appearance`] and [`Dimmer::adjust_position`] any number
//!    of times, the last call of each kind wins,
//! 3. [`Dimmer::update_dims`] reconciles the surface with the request and records the needed
//!    commands on the frame's transaction.
//!
//! The dimmer is not synchronized. All passes must run on the thread that owns it; animation
//! completions from other threads are queued and only applied by [`Dimmer::update_dims`] or
//! [`Dimmer::process_animation_events`].

mod state;

#[cfg(test)]
mod tests;

pub use state::DimAnimationKind;

use crate::animation::{AlphaAnimationSpec, AnimationEvent, AnimationFactory, AnimationOutcome, AnimationToken};
use crate::bounds::{resolve_dim_bounds, DimMode};
use crate::config::Config;
use crate::container::{DimContainer, GeometrySnapshot};
use crate::error::DimmerResult;
use crate::geometry::Bounds;
use crate::surface::{SurfaceHandle, Transaction};
use log::{debug, error, trace, warn};
use state::{DimProperties, DimState, DimTransition, PositionRequest};
use std::time::Duration;
use tokio::sync::mpsc;

/// The container that hosts the dim surface.
pub trait DimHost {
    fn bounds(&self) -> Bounds;

    /// Creates a child surface for the dim layer.
    fn make_child_surface(&mut self, name: &str) -> DimmerResult<SurfaceHandle>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DimmerSettings {
    pub mode: DimMode,
    pub animation_duration: Duration,
    pub layer_name: String,
    /// Z order of the dim relative to the container it is positioned against.
    pub relative_layer_z: i32,
    /// Whether removing the dim fades it out first.
    pub animate_exit: bool,
}

impl Default for DimmerSettings {
    fn default() -> Self {
        Self {
            mode: DimMode::default(),
            animation_duration: Duration::from_millis(200),
            layer_name: "Dim Layer".to_string(),
            relative_layer_z: -1,
            animate_exit: true,
        }
    }
}

impl DimmerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            mode: config.dim_mode,
            animation_duration: Duration::from_millis(config.animation_duration_ms as u64),
            layer_name: config.dim_layer_name.clone(),
            relative_layer_z: config.relative_layer_z,
            animate_exit: config.animate_exit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassPhase {
    Collecting,
    Flushed,
}

pub struct Dimmer<H: DimHost> {
    host: H,
    settings: DimmerSettings,
    animations: Box<dyn AnimationFactory>,
    requested: Option<DimProperties>,
    position: Option<PositionRequest>,
    dim: Option<DimState>,
    dim_bounds: Bounds,
    phase: PassPhase,
    next_token: u64,
    event_sender: mpsc::UnboundedSender<AnimationEvent>,
    event_receiver: mpsc::UnboundedReceiver<AnimationEvent>,
}

impl<H: DimHost> Dimmer<H> {
    pub fn new(host: H, animations: Box<dyn AnimationFactory>) -> Self {
        Self::with_settings(host, animations, DimmerSettings::default())
    }

    pub fn with_settings(
        host: H,
        animations: Box<dyn AnimationFactory>,
        settings: DimmerSettings,
    ) -> Self {
        let (event_sender, event_receiver) = mpsc::unbounded_channel();
        Self {
            host,
            settings,
            animations,
            requested: None,
            position: None,
            dim: None,
            dim_bounds: Bounds::default(),
            phase: PassPhase::Collecting,
            next_token: 1,
            event_sender,
            event_receiver,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn settings(&self) -> &DimmerSettings {
        &self.settings
    }

    /// The dim surface, if one currently exists.
    pub fn get_dim_layer(&self) -> Option<SurfaceHandle> {
        self.dim.as_ref().map(|dim| dim.surface)
    }

    /// Absolute bounds resolved by the last [`Dimmer::update_dims`]. Empty once the dim
    /// surface is removed.
    pub fn get_dim_bounds(&self) -> Bounds {
        self.dim_bounds
    }

    pub fn is_animating(&self) -> bool {
        self.dim.as_ref().is_some_and(DimState::is_animating)
    }

    /// The animation in flight, if any.
    pub fn running_animation(&self) -> Option<DimAnimationKind> {
        self.dim
            .as_ref()
            .and_then(|dim| dim.animation.as_ref())
            .map(|animation| animation.kind)
    }

    /// Starts a new pass. Committed state and the surface are left alone.
    pub fn reset_dim_states(&mut self) {
        self.requested = None;
        self.position = None;
        self.phase = PassPhase::Collecting;
    }

    /// Requests the dim for this pass. Alpha is clamped to `[0, 1]` and negative blur to 0.
    ///
    /// The surface is created here if the request is visible and none exists yet.
    pub fn adjust_appearance(
        &mut self,
        requester: &dyn DimContainer,
        alpha: f32,
        blur_radius: i32,
    ) {
        self.check_collecting("adjust_appearance");

        let request = DimProperties::new(requester.id(), alpha, blur_radius);
        if request.is_visible() {
            self.ensure_dim_surface();
        }
        if let Some(previous) = self.requested.filter(|p| p.requester != request.requester) {
            trace!(
                "{} replaces {} as dim requester for this pass",
                request.requester,
                previous.requester
            );
        }
        self.requested = Some(request);
    }

    /// Chooses the container whose bounds the dim covers and the one it is layered against.
    pub fn adjust_position(
        &mut self,
        bounds_owner: &dyn DimContainer,
        relative_layer: &dyn DimContainer,
    ) {
        self.check_collecting("adjust_position");

        self.position = Some(PositionRequest {
            geometry: GeometrySnapshot::capture(bounds_owner),
            relative_layer: relative_layer.surface(),
        });
    }

    /// Removes the dim without a fade out the next time it is dropped.
    pub fn dont_animate_exit(&mut self) {
        if let Some(dim) = self.dim.as_mut() {
            dim.animate_exit = false;
        }
    }

    /// Reconciles the dim surface with this pass's request, recording the changes on
    /// `transaction`. Called once per frame.
    pub fn update_dims(&mut self, transaction: &mut dyn Transaction) {
        self.process_animation_events(transaction);
        self.phase = PassPhase::Flushed;

        match self.requested {
            Some(request) => self.update_with_request(request, transaction),
            None => self.update_without_request(transaction),
        }

        // Adapters that finish synchronously land in this same transaction
        self.process_animation_events(transaction);
    }

    /// Applies the animation completions queued since the last call. Returns how many were
    /// for the running animation.
    pub fn process_animation_events(&mut self, transaction: &mut dyn Transaction) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.event_receiver.try_recv() {
            if self.handle_animation_event(event, transaction) {
                handled += 1;
            }
        }
        handled
    }

    fn check_collecting(&self, operation: &str) {
        if self.phase == PassPhase::Flushed {
            warn!("{operation} called after update_dims without reset_dim_states");
        }
    }

    fn ensure_dim_surface(&mut self) -> bool {
        if self.dim.is_some() {
            return true;
        }

        match self.host.make_child_surface(&self.settings.layer_name) {
            Ok(surface) => {
                debug!("Created dim layer {surface}");
                self.dim = Some(DimState::new(surface, self.settings.animate_exit));
                true
            }
            Err(e) => {
                error!("{e}, dim stays hidden until it is requested again");
                false
            }
        }
    }

    fn update_without_request(&mut self, transaction: &mut dyn Transaction) {
        let Some(dim) = self.dim.as_ref() else {
            return;
        };
        if dim.is_exiting() {
            return;
        }

        let animate_exit = dim.animate_exit;
        let from_alpha = dim.displayed_alpha().filter(|_| dim.shown);
        match from_alpha {
            Some(from_alpha) if animate_exit => {
                self.start_animation(DimAnimationKind::Exit, from_alpha, 0.0, transaction);
            }
            _ => self.remove_dim(transaction),
        }
    }

    fn update_with_request(&mut self, request: DimProperties, transaction: &mut dyn Transaction) {
        if self.dim.is_none() {
            if !request.is_visible() {
                return;
            }
            if !self.ensure_dim_surface() {
                return;
            }
        }

        let resolved = resolve_dim_bounds(
            self.settings.mode,
            self.position.as_ref().map(|p| &p.geometry),
            &self.host.bounds(),
        );
        self.dim_bounds = resolved.bounds;

        let relative_layer = self.position.and_then(|p| p.relative_layer);
        let relative_layer_z = self.settings.relative_layer_z;
        let Some(dim) = self.dim.as_mut() else {
            return;
        };
        let surface = dim.surface;

        if dim.current.is_none() && !request.is_visible() {
            // Never shown and nothing to show
            self.remove_dim(transaction);
            return;
        }

        if let Some(relative_to) = relative_layer {
            if dim.relative_layer != Some(relative_to) {
                transaction.set_relative_layer(surface, relative_to, relative_layer_z);
                dim.relative_layer = Some(relative_to);
            }
        }

        if dim.bounds != Some(resolved) {
            transaction.set_window_crop(surface, resolved.bounds.width(), resolved.bounds.height());
            transaction.set_position(surface, resolved.position.x, resolved.position.y);
            dim.bounds = Some(resolved);
        }

        if !dim.shown {
            transaction.set_alpha(surface, 0.0);
            transaction.show(surface);
            dim.shown = true;
        }

        let blur_changed = dim
            .current
            .map_or(request.blur_radius > 0, |c| c.blur_radius != request.blur_radius);

        match dim.transition_to(&request) {
            DimTransition::None => {}
            DimTransition::Direct => {
                let interrupted = dim.is_animating();
                dim.cancel_animation();
                if interrupted || dim.current.map(|c| c.alpha) != Some(request.alpha) {
                    transaction.set_alpha(surface, request.alpha);
                }
                if blur_changed {
                    transaction.set_background_blur_radius(surface, request.blur_radius);
                }
                dim.current = Some(request);
            }
            DimTransition::Animate { kind, from_alpha } => {
                if blur_changed {
                    transaction.set_background_blur_radius(surface, request.blur_radius);
                }
                dim.current = Some(request);
                self.start_animation(kind, from_alpha, request.alpha, transaction);
            }
        }

        if !request.is_visible() && !self.is_animating() {
            self.remove_dim(transaction);
        }
    }

    fn start_animation(
        &mut self,
        kind: DimAnimationKind,
        from_alpha: f32,
        to_alpha: f32,
        transaction: &mut dyn Transaction,
    ) {
        let token = AnimationToken(self.next_token);
        self.next_token += 1;
        let spec = AlphaAnimationSpec {
            from_alpha,
            to_alpha,
            duration: self.settings.animation_duration,
        };

        if let Some(dim) = self.dim.as_mut() {
            dim.start_animation(
                self.animations.as_mut(),
                kind,
                spec,
                token,
                &self.event_sender,
                transaction,
            );
        }
    }

    fn handle_animation_event(
        &mut self,
        event: AnimationEvent,
        transaction: &mut dyn Transaction,
    ) -> bool {
        let Some(dim) = self.dim.as_mut() else {
            trace!("Ignoring {:?} for a removed dim", event.token);
            return false;
        };
        let Some(animation) = dim.take_animation(event.token) else {
            trace!("Ignoring stale animation {:?}", event.token);
            return false;
        };

        if event.outcome == AnimationOutcome::Aborted {
            warn!(
                "{:?} animation {:?} ended abnormally, applying its final state",
                animation.kind, animation.token
            );
        }

        match animation.kind {
            DimAnimationKind::Exit => self.remove_dim(transaction),
            DimAnimationKind::Enter | DimAnimationKind::Handover => {
                transaction.set_alpha(dim.surface, animation.target_alpha);
                if !dim.current.is_some_and(|c| c.is_visible()) {
                    self.remove_dim(transaction);
                }
            }
        }
        true
    }

    fn remove_dim(&mut self, transaction: &mut dyn Transaction) {
        if let Some(mut dim) = self.dim.take() {
            dim.cancel_animation();
            debug!("Removing dim layer {}", dim.surface);
            transaction.remove(dim.surface);
        }
        self.dim_bounds = Bounds::default();
    }
}
