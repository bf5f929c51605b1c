use crate::surface::{SurfaceHandle, Transaction};
use log::trace;
use std::fmt::Debug;
use std::time::Duration;
use tokio::sync::mpsc;

/// Identifies one started animation. A completion carrying an outdated token is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationToken(pub u64);

/// Fade of a surface's alpha from one value to another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaAnimationSpec {
    pub from_alpha: f32,
    pub to_alpha: f32,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationOutcome {
    Completed,
    /// The animation stopped early: cancelled, failed, or dropped without finishing.
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationEvent {
    pub token: AnimationToken,
    pub outcome: AnimationOutcome,
}

/// Completion handle handed to an adapter. May be sent to and finished on any thread; the
/// event is queued for the dimmer's owning thread.
///
/// Dropping the callback without calling [`AnimationCallback::finish`] reports
/// [`AnimationOutcome::Aborted`].
#[derive(Debug)]
pub struct AnimationCallback {
    token: AnimationToken,
    sender: Option<mpsc::UnboundedSender<AnimationEvent>>,
}

impl AnimationCallback {
    pub(crate) fn new(token: AnimationToken, sender: mpsc::UnboundedSender<AnimationEvent>) -> Self {
        Self {
            token,
            sender: Some(sender),
        }
    }

    pub fn token(&self) -> AnimationToken {
        self.token
    }

    pub fn finish(mut self, outcome: AnimationOutcome) {
        self.send(outcome);
    }

    fn send(&mut self, outcome: AnimationOutcome) {
        if let Some(sender) = self.sender.take() {
            // The dimmer may already be gone, nothing left to notify then
            if sender
                .send(AnimationEvent {
                    token: self.token,
                    outcome,
                })
                .is_err()
            {
                trace!("Animation {:?} finished after its dimmer was dropped", self.token);
            }
        }
    }
}

impl Drop for AnimationCallback {
    fn drop(&mut self) {
        self.send(AnimationOutcome::Aborted);
    }
}

/// Runs one alpha animation on a surface.
pub trait AnimationAdapter: Debug {
    /// Starts animating `surface`. Setup commands may be recorded on `transaction`; the adapter
    /// must eventually finish or drop `callback`.
    fn start_animation(
        &mut self,
        surface: SurfaceHandle,
        transaction: &mut dyn Transaction,
        callback: AnimationCallback,
    );

    /// Stops the animation. Called before the adapter is replaced or dropped.
    fn cancel(&mut self) {}

    /// Alpha currently shown on the surface while the animation runs, if the adapter knows it.
    fn current_alpha(&self) -> Option<f32> {
        None
    }
}

/// Builds adapters for the dimmer's fades.
pub trait AnimationFactory {
    fn create(&mut self, spec: AlphaAnimationSpec) -> Box<dyn AnimationAdapter>;
}
