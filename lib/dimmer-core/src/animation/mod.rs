mod adapter;
mod animator;
mod runner;

pub use adapter::{
    AlphaAnimationSpec, AnimationAdapter, AnimationCallback, AnimationEvent, AnimationFactory,
    AnimationOutcome, AnimationToken,
};
pub use animator::{ease_in_out_cubic, linear, Animator, Easing, Interpolatable};
pub use runner::{
    AnimationThread, AnimationThreadCommand, AnimationThreadConfig, DisplayedAlpha, SharedCompositor,
    ThreadedAnimation, ThreadedAnimationFactory,
};
