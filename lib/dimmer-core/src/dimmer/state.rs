use crate::animation::{
    AlphaAnimationSpec, AnimationAdapter, AnimationCallback, AnimationEvent, AnimationFactory,
    AnimationToken,
};
use crate::bounds::ResolvedBounds;
use crate::container::{ContainerId, GeometrySnapshot};
use crate::surface::{SurfaceHandle, Transaction};
use log::trace;
use tokio::sync::mpsc;

/// Appearance asked for by one requester.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DimProperties {
    pub requester: ContainerId,
    pub alpha: f32,
    pub blur_radius: u32,
}

impl DimProperties {
    pub fn new(requester: ContainerId, alpha: f32, blur_radius: i32) -> Self {
        let alpha = if alpha.is_nan() {
            0.0
        } else {
            alpha.clamp(0.0, 1.0)
        };
        Self {
            requester,
            alpha,
            blur_radius: blur_radius.max(0) as u32,
        }
    }

    /// Whether this appearance needs a surface at all.
    pub fn is_visible(&self) -> bool {
        self.alpha > 0.0 || self.blur_radius > 0
    }

    pub fn same_values(&self, other: &DimProperties) -> bool {
        self.alpha == other.alpha && self.blur_radius == other.blur_radius
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PositionRequest {
    pub geometry: GeometrySnapshot,
    pub relative_layer: Option<SurfaceHandle>,
}

/// Why the dimmer started an animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimAnimationKind {
    /// Fade in of a freshly shown dim.
    Enter,
    /// Cross-fade after another requester took over the dim.
    Handover,
    /// Fade out before the surface is removed.
    Exit,
}

#[derive(Debug)]
pub(crate) struct RunningAnimation {
    pub token: AnimationToken,
    pub kind: DimAnimationKind,
    pub target_alpha: f32,
    adapter: Box<dyn AnimationAdapter>,
}

/// What the next commit does with the appearance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum DimTransition {
    None,
    /// The requester drives its own values, apply them as is.
    Direct,
    Animate {
        kind: DimAnimationKind,
        from_alpha: f32,
    },
}

/// Persistent state of the dim surface.
#[derive(Debug)]
pub(crate) struct DimState {
    pub surface: SurfaceHandle,
    pub shown: bool,
    pub animate_exit: bool,
    /// Last appearance written or being animated to.
    pub current: Option<DimProperties>,
    pub bounds: Option<ResolvedBounds>,
    pub relative_layer: Option<SurfaceHandle>,
    pub animation: Option<RunningAnimation>,
}

impl DimState {
    pub fn new(surface: SurfaceHandle, animate_exit: bool) -> Self {
        Self {
            surface,
            shown: false,
            animate_exit,
            current: None,
            bounds: None,
            relative_layer: None,
            animation: None,
        }
    }

    pub fn is_exiting(&self) -> bool {
        self.animation
            .as_ref()
            .is_some_and(|a| a.kind == DimAnimationKind::Exit)
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Alpha on screen right now. Mid-animation this is the animation's value, not its target.
    pub fn displayed_alpha(&self) -> Option<f32> {
        let current = self.current.as_ref()?;
        let animated = self
            .animation
            .as_ref()
            .and_then(|animation| animation.adapter.current_alpha());
        Some(animated.unwrap_or(current.alpha))
    }

    pub fn transition_to(&self, request: &DimProperties) -> DimTransition {
        let Some(current) = self.current.as_ref() else {
            return DimTransition::Animate {
                kind: DimAnimationKind::Enter,
                from_alpha: 0.0,
            };
        };

        let from_alpha = self.displayed_alpha().unwrap_or(current.alpha);
        if self.is_exiting() {
            return DimTransition::Animate {
                kind: DimAnimationKind::Enter,
                from_alpha,
            };
        }

        if current.requester != request.requester {
            return DimTransition::Animate {
                kind: DimAnimationKind::Handover,
                from_alpha,
            };
        }

        if current.same_values(request) {
            DimTransition::None
        } else {
            DimTransition::Direct
        }
    }

    /// Starts a new alpha animation, cancelling the one in flight.
    pub fn start_animation(
        &mut self,
        factory: &mut dyn AnimationFactory,
        kind: DimAnimationKind,
        spec: AlphaAnimationSpec,
        token: AnimationToken,
        events: &mpsc::UnboundedSender<AnimationEvent>,
        transaction: &mut dyn Transaction,
    ) {
        self.cancel_animation();

        trace!(
            "Starting {:?} animation {:?} on {}: {:.3} -> {:.3}",
            kind,
            token,
            self.surface,
            spec.from_alpha,
            spec.to_alpha
        );
        let mut adapter = factory.create(spec);
        adapter.start_animation(
            self.surface,
            transaction,
            AnimationCallback::new(token, events.clone()),
        );
        self.animation = Some(RunningAnimation {
            token,
            kind,
            target_alpha: spec.to_alpha,
            adapter,
        });
    }

    pub fn cancel_animation(&mut self) {
        if let Some(mut animation) = self.animation.take() {
            trace!("Cancelling {:?} animation {:?}", animation.kind, animation.token);
            animation.adapter.cancel();
        }
    }

    /// Takes the running animation if `token` identifies it.
    pub fn take_animation(&mut self, token: AnimationToken) -> Option<RunningAnimation> {
        if self.animation.as_ref()?.token == token {
            self.animation.take()
        } else {
            None
        }
    }
}
