use crate::animation::adapter::{
    AlphaAnimationSpec, AnimationAdapter, AnimationCallback, AnimationFactory, AnimationOutcome,
    AnimationToken,
};
use crate::animation::animator::{Animator, Easing};
use crate::config::Config;
use crate::surface::{CommandTransaction, Compositor, SurfaceHandle, Transaction};
use log::{debug, error, trace, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

pub type SharedCompositor = Arc<Mutex<dyn Compositor>>;

/// Last alpha the animation thread wrote for one animation, stored as `f32` bits.
#[derive(Debug, Clone)]
pub struct DisplayedAlpha(Arc<AtomicU32>);

impl DisplayedAlpha {
    fn new(alpha: f32) -> Self {
        Self(Arc::new(AtomicU32::new(alpha.to_bits())))
    }

    fn store(&self, alpha: f32) {
        self.0.store(alpha.to_bits(), Ordering::Release);
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }
}

#[derive(Debug)]
pub enum AnimationThreadCommand {
    Start {
        surface: SurfaceHandle,
        spec: AlphaAnimationSpec,
        displayed: DisplayedAlpha,
        callback: AnimationCallback,
    },
    Cancel(AnimationToken),
    Exit,
}

#[derive(Debug, Clone)]
pub struct AnimationThreadConfig {
    pub animation_fps: u32,
    pub easing: Easing,
}

impl Default for AnimationThreadConfig {
    fn default() -> Self {
        Self {
            animation_fps: 60,
            easing: Easing::default(),
        }
    }
}

impl AnimationThreadConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            animation_fps: config.animation_fps,
            easing: config.easing,
        }
    }
}

struct RunningAnimation {
    surface: SurfaceHandle,
    animator: Animator<f32>,
    displayed: DisplayedAlpha,
    callback: AnimationCallback,
}

/// Dedicated thread that steps alpha animations and applies each frame to a compositor.
pub struct AnimationThread {
    command_sender: mpsc::UnboundedSender<AnimationThreadCommand>,
    animator_thread: Option<thread::JoinHandle<()>>,
}

struct AnimationThreadAnimator {
    config: AnimationThreadConfig,
    compositor: SharedCompositor,
    running: HashMap<AnimationToken, RunningAnimation>,
    command_receiver: mpsc::UnboundedReceiver<AnimationThreadCommand>,
}

impl AnimationThread {
    pub fn new(config: AnimationThreadConfig, compositor: SharedCompositor) -> Self {
        let (command_sender, command_receiver) = mpsc::unbounded_channel();

        let animator_thread = thread::spawn(move || {
            let mut animator = AnimationThreadAnimator {
                config,
                compositor,
                running: HashMap::new(),
                command_receiver,
            };

            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    error!("Failed to start animation runtime: {e}");
                    return;
                }
            };
            rt.block_on(animator.run_loop());
        });

        Self {
            command_sender,
            animator_thread: Some(animator_thread),
        }
    }

    /// Factory whose adapters run on this thread.
    pub fn factory(&self) -> ThreadedAnimationFactory {
        ThreadedAnimationFactory {
            command_sender: self.command_sender.clone(),
        }
    }
}

impl Drop for AnimationThread {
    fn drop(&mut self) {
        let _ = self.command_sender.send(AnimationThreadCommand::Exit);
        if let Some(thread) = self.animator_thread.take() {
            let _ = thread.join();
        }
    }
}

impl AnimationThreadAnimator {
    async fn run_loop(&mut self) {
        let mut running = true;
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.animation_fps.max(1) as f64);
        let mut last_frame_time = Instant::now();

        while running {
            while let Ok(cmd) = self.command_receiver.try_recv() {
                self.handle_command(cmd, &mut running);
            }

            if !running {
                break;
            }

            if !self.running.is_empty() {
                let now = Instant::now();
                let elapsed = now.duration_since(last_frame_time);

                if elapsed >= frame_duration {
                    self.animate_frame();
                    last_frame_time = now;
                } else {
                    tokio::time::sleep(frame_duration - elapsed).await;
                }
            } else {
                match self.command_receiver.recv().await {
                    Some(cmd) => self.handle_command(cmd, &mut running),
                    None => running = false,
                }
            }
        }

        if !self.running.is_empty() {
            debug!(
                "Animation thread exiting with {} animations in flight",
                self.running.len()
            );
        }
    }

    fn handle_command(&mut self, cmd: AnimationThreadCommand, running: &mut bool) {
        match cmd {
            AnimationThreadCommand::Start {
                surface,
                spec,
                displayed,
                callback,
            } => {
                let mut animator =
                    Animator::new(spec.from_alpha, spec.to_alpha, self.config.easing.as_fn());
                animator.start_from(spec.from_alpha, spec.to_alpha, spec.duration.as_millis() as u32);
                trace!(
                    "Animating {surface} alpha {:.3} -> {:.3} over {:?}",
                    spec.from_alpha,
                    spec.to_alpha,
                    spec.duration
                );

                let token = callback.token();
                self.running.insert(
                    token,
                    RunningAnimation {
                        surface,
                        animator,
                        displayed,
                        callback,
                    },
                );
            }
            AnimationThreadCommand::Cancel(token) => {
                // Dropping the callback reports the animation as aborted
                if self.running.remove(&token).is_some() {
                    trace!("Cancelled animation {:?}", token);
                }
            }
            AnimationThreadCommand::Exit => {
                *running = false;
            }
        }
    }

    fn animate_frame(&mut self) {
        let mut transaction = CommandTransaction::new();
        let mut completed = Vec::new();

        for (token, animation) in self.running.iter_mut() {
            if let Some(alpha) = animation.animator.update() {
                transaction.set_alpha(animation.surface, alpha);
                animation.displayed.store(alpha);
            }

            if !animation.animator.is_animating() {
                completed.push(*token);
            }
        }

        if !transaction.is_empty() {
            match self.compositor.lock() {
                Ok(mut compositor) => compositor.apply(transaction),
                Err(e) => warn!("Failed to apply animation frame: {e}"),
            }
        }

        for token in completed {
            if let Some(animation) = self.running.remove(&token) {
                animation.callback.finish(AnimationOutcome::Completed);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ThreadedAnimationFactory {
    command_sender: mpsc::UnboundedSender<AnimationThreadCommand>,
}

impl AnimationFactory for ThreadedAnimationFactory {
    fn create(&mut self, spec: AlphaAnimationSpec) -> Box<dyn AnimationAdapter> {
        Box::new(ThreadedAnimation {
            spec,
            command_sender: self.command_sender.clone(),
            displayed: DisplayedAlpha::new(spec.from_alpha),
            token: None,
        })
    }
}

#[derive(Debug)]
pub struct ThreadedAnimation {
    spec: AlphaAnimationSpec,
    command_sender: mpsc::UnboundedSender<AnimationThreadCommand>,
    displayed: DisplayedAlpha,
    token: Option<AnimationToken>,
}

impl AnimationAdapter for ThreadedAnimation {
    fn start_animation(
        &mut self,
        surface: SurfaceHandle,
        transaction: &mut dyn Transaction,
        callback: AnimationCallback,
    ) {
        transaction.set_alpha(surface, self.spec.from_alpha);
        self.token = Some(callback.token());

        if let Err(e) = self.command_sender.send(AnimationThreadCommand::Start {
            surface,
            spec: self.spec,
            displayed: self.displayed.clone(),
            callback,
        }) {
            // The rejected command drops its callback, which reports the abort
            error!("Failed to send animation to animation thread: {e}");
        }
    }

    fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            let _ = self
                .command_sender
                .send(AnimationThreadCommand::Cancel(token));
        }
    }

    fn current_alpha(&self) -> Option<f32> {
        self.token.map(|_| self.displayed.load())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::adapter::AnimationEvent;
    use crate::mock::HeadlessCompositor;

    fn wait_for_event(rx: &mut mpsc::UnboundedReceiver<AnimationEvent>) -> AnimationEvent {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Ok(event) = rx.try_recv() {
                return event;
            }
            assert!(Instant::now() < deadline, "animation never finished");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_animation_reaches_target() {
        let compositor = Arc::new(Mutex::new(HeadlessCompositor::new()));
        let thread = AnimationThread::new(
            AnimationThreadConfig {
                animation_fps: 240,
                easing: Easing::Linear,
            },
            compositor.clone(),
        );
        let mut factory = thread.factory();
        let surface = SurfaceHandle(1);
        compositor.lock().unwrap().register(surface);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut adapter = factory.create(AlphaAnimationSpec {
            from_alpha: 0.0,
            to_alpha: 0.6,
            duration: Duration::from_millis(30),
        });
        let mut setup = CommandTransaction::new();
        adapter.start_animation(
            surface,
            &mut setup,
            AnimationCallback::new(AnimationToken(1), tx),
        );
        assert_eq!(setup.last_alpha(surface), Some(0.0));

        let event = wait_for_event(&mut rx);
        assert_eq!(event.outcome, AnimationOutcome::Completed);
        let alpha = compositor.lock().unwrap().surface(surface).unwrap().alpha;
        assert!((alpha - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_cancel_reports_aborted() {
        let compositor = Arc::new(Mutex::new(HeadlessCompositor::new()));
        let thread = AnimationThread::new(AnimationThreadConfig::default(), compositor);
        let mut factory = thread.factory();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut adapter = factory.create(AlphaAnimationSpec {
            from_alpha: 0.0,
            to_alpha: 1.0,
            duration: Duration::from_secs(60),
        });
        adapter.start_animation(
            SurfaceHandle(2),
            &mut CommandTransaction::new(),
            AnimationCallback::new(AnimationToken(7), tx),
        );
        adapter.cancel();

        let event = wait_for_event(&mut rx);
        assert_eq!(event.token, AnimationToken(7));
        assert_eq!(event.outcome, AnimationOutcome::Aborted);
    }

    #[test]
    fn test_current_alpha_tracks_frames() {
        let compositor = Arc::new(Mutex::new(HeadlessCompositor::new()));
        let thread = AnimationThread::new(
            AnimationThreadConfig {
                animation_fps: 240,
                easing: Easing::Linear,
            },
            compositor.clone(),
        );
        let mut factory = thread.factory();
        let surface = SurfaceHandle(3);
        compositor.lock().unwrap().register(surface);

        let (tx, _rx) = mpsc::unbounded_channel();
        let mut adapter = factory.create(AlphaAnimationSpec {
            from_alpha: 0.0,
            to_alpha: 1.0,
            duration: Duration::from_secs(2),
        });
        assert_eq!(adapter.current_alpha(), None);

        adapter.start_animation(
            surface,
            &mut CommandTransaction::new(),
            AnimationCallback::new(AnimationToken(9), tx),
        );
        assert_eq!(adapter.current_alpha(), Some(0.0));

        thread::sleep(Duration::from_millis(150));
        let alpha = adapter.current_alpha().unwrap();
        assert!(alpha > 0.0 && alpha < 0.5, "alpha {alpha}");

        adapter.cancel();
        assert_eq!(adapter.current_alpha(), None);
    }
}
