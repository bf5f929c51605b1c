//! Fixed-rate frame loop for driving dim passes outside a real compositor.

use log::trace;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};

pub struct FrameDriver {
    frame_duration: Duration,
    shutdown: Arc<AtomicBool>,
}

impl FrameDriver {
    pub fn new(fps: u32, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            frame_duration: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            shutdown,
        }
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Calls `on_frame` with the frame index once per frame until it returns `false` or the
    /// shutdown flag is set. Returns the number of frames run.
    pub async fn run<F>(&self, mut on_frame: F) -> u64
    where
        F: FnMut(u64) -> bool,
    {
        let mut interval = time::interval(self.frame_duration);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut frame = 0;
        loop {
            interval.tick().await;
            if self.shutdown.load(Ordering::SeqCst) {
                trace!("Frame loop stopped by shutdown after {frame} frames");
                break;
            }

            let keep_going = on_frame(frame);
            frame += 1;
            if !keep_going {
                break;
            }
        }
        frame
    }
}
