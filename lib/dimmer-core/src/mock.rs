//! In-memory stand-ins for the compositor, the host and the animation engine.

use crate::animation::{
    AlphaAnimationSpec, AnimationAdapter, AnimationCallback, AnimationFactory, AnimationOutcome,
    AnimationToken,
};
use crate::dimmer::DimHost;
use crate::error::{DimmerError, DimmerResult};
use crate::geometry::{Bounds, Position, Size};
use crate::surface::{CommandTransaction, Compositor, SurfaceCommand, SurfaceHandle, Transaction};
use indexmap::IndexMap;
use log::{trace, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurfaceProperties {
    pub alpha: f32,
    pub crop: Option<Size>,
    pub position: Position,
    pub blur_radius: u32,
    pub visible: bool,
    pub relative_layer: Option<(SurfaceHandle, i32)>,
}

/// Compositor that only tracks the last state written to each surface.
#[derive(Debug, Default)]
pub struct HeadlessCompositor {
    surfaces: IndexMap<SurfaceHandle, SurfaceProperties>,
    removed: Vec<SurfaceHandle>,
    next_id: u64,
}

impl HeadlessCompositor {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Creates a new hidden surface and returns its handle.
    pub fn allocate(&mut self) -> SurfaceHandle {
        let handle = SurfaceHandle(self.next_id);
        self.next_id += 1;
        self.register(handle);
        handle
    }

    pub fn register(&mut self, surface: SurfaceHandle) {
        self.next_id = self.next_id.max(surface.0 + 1);
        self.surfaces.entry(surface).or_default();
    }

    pub fn surface(&self, surface: SurfaceHandle) -> Option<&SurfaceProperties> {
        self.surfaces.get(&surface)
    }

    pub fn surfaces(&self) -> impl Iterator<Item = (&SurfaceHandle, &SurfaceProperties)> {
        self.surfaces.iter()
    }

    pub fn is_removed(&self, surface: SurfaceHandle) -> bool {
        self.removed.contains(&surface)
    }

    fn apply_command(&mut self, command: SurfaceCommand) {
        let surface = command.surface();
        if self.is_removed(surface) {
            warn!("Ignoring {command} on removed surface");
            return;
        }

        if let SurfaceCommand::Remove { .. } = command {
            self.surfaces.shift_remove(&surface);
            self.removed.push(surface);
            return;
        }

        let properties = self.surfaces.entry(surface).or_default();
        match command {
            SurfaceCommand::SetAlpha { alpha, .. } => properties.alpha = alpha,
            SurfaceCommand::SetWindowCrop { width, height, .. } => {
                properties.crop = Some(Size::new(width, height))
            }
            SurfaceCommand::SetPosition { x, y, .. } => properties.position = Position::new(x, y),
            SurfaceCommand::SetBackgroundBlurRadius { radius, .. } => {
                properties.blur_radius = radius
            }
            SurfaceCommand::SetRelativeLayer { relative_to, z, .. } => {
                properties.relative_layer = Some((relative_to, z))
            }
            SurfaceCommand::Show { .. } => properties.visible = true,
            SurfaceCommand::Remove { .. } => {}
        }
    }
}

impl Compositor for HeadlessCompositor {
    fn apply(&mut self, transaction: CommandTransaction) {
        for command in transaction {
            self.apply_command(command);
        }
    }
}

/// Host with settable bounds that hands out fresh surface handles.
#[derive(Debug)]
pub struct MockHost {
    pub bounds: Bounds,
    pub fail_creation: bool,
    created: Vec<SurfaceHandle>,
    next_surface: u64,
}

impl MockHost {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            fail_creation: false,
            created: Vec::new(),
            next_surface: 1000,
        }
    }

    pub fn created(&self) -> &[SurfaceHandle] {
        &self.created
    }
}

impl DimHost for MockHost {
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn make_child_surface(&mut self, name: &str) -> DimmerResult<SurfaceHandle> {
        if self.fail_creation {
            return Err(DimmerError::SurfaceCreation(format!(
                "no surface available for {name}"
            )));
        }
        let surface = SurfaceHandle(self.next_surface);
        self.next_surface += 1;
        self.created.push(surface);
        Ok(surface)
    }
}

/// Host whose surfaces live in a shared [`HeadlessCompositor`].
#[derive(Debug)]
pub struct HeadlessHost {
    pub bounds: Bounds,
    compositor: Arc<Mutex<HeadlessCompositor>>,
}

impl HeadlessHost {
    pub fn new(bounds: Bounds, compositor: Arc<Mutex<HeadlessCompositor>>) -> Self {
        Self { bounds, compositor }
    }
}

impl DimHost for HeadlessHost {
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn make_child_surface(&mut self, name: &str) -> DimmerResult<SurfaceHandle> {
        let surface = lock(&self.compositor).allocate();
        trace!("Allocated {surface} for {name}");
        Ok(surface)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartedAnimation {
    pub surface: SurfaceHandle,
    pub spec: AlphaAnimationSpec,
    pub token: AnimationToken,
}

#[derive(Debug, Default)]
struct ManualAnimationLog {
    started: Vec<StartedAnimation>,
    pending: Vec<AnimationCallback>,
    cancelled: Vec<AnimationToken>,
    displayed: HashMap<AnimationToken, f32>,
}

/// Animations that only finish when the test says so.
#[derive(Debug, Clone, Default)]
pub struct ManualAnimationFactory {
    log: Arc<Mutex<ManualAnimationLog>>,
}

impl ManualAnimationFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started(&self) -> Vec<StartedAnimation> {
        lock(&self.log).started.clone()
    }

    pub fn start_count(&self) -> usize {
        lock(&self.log).started.len()
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.log).pending.len()
    }

    pub fn cancelled(&self) -> Vec<AnimationToken> {
        lock(&self.log).cancelled.clone()
    }

    /// Forgets the recorded starts and cancellations. Pending animations keep running.
    pub fn clear_history(&self) {
        let mut log = lock(&self.log);
        log.started.clear();
        log.cancelled.clear();
    }

    /// Pretends every pending animation has reached `alpha` so far.
    pub fn set_displayed_alpha(&self, alpha: f32) {
        let mut log = lock(&self.log);
        let tokens: Vec<_> = log.pending.iter().map(|c| c.token()).collect();
        for token in tokens {
            log.displayed.insert(token, alpha);
        }
    }

    /// Finishes every pending animation with `outcome`. Returns how many were finished.
    pub fn finish_all(&self, outcome: AnimationOutcome) -> usize {
        let pending = std::mem::take(&mut lock(&self.log).pending);
        let count = pending.len();
        for callback in pending {
            callback.finish(outcome);
        }
        count
    }
}

impl AnimationFactory for ManualAnimationFactory {
    fn create(&mut self, spec: AlphaAnimationSpec) -> Box<dyn AnimationAdapter> {
        Box::new(ManualAnimation {
            spec,
            log: self.log.clone(),
            token: None,
        })
    }
}

#[derive(Debug)]
struct ManualAnimation {
    spec: AlphaAnimationSpec,
    log: Arc<Mutex<ManualAnimationLog>>,
    token: Option<AnimationToken>,
}

impl AnimationAdapter for ManualAnimation {
    fn start_animation(
        &mut self,
        surface: SurfaceHandle,
        _transaction: &mut dyn Transaction,
        callback: AnimationCallback,
    ) {
        let token = callback.token();
        self.token = Some(token);
        let mut log = lock(&self.log);
        log.started.push(StartedAnimation {
            surface,
            spec: self.spec,
            token,
        });
        log.pending.push(callback);
    }

    fn cancel(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };
        let callback = {
            let mut log = lock(&self.log);
            log.cancelled.push(token);
            log.displayed.remove(&token);
            log.pending
                .iter()
                .position(|c| c.token() == token)
                .map(|index| log.pending.remove(index))
        };
        drop(callback);
    }

    fn current_alpha(&self) -> Option<f32> {
        let token = self.token?;
        lock(&self.log).displayed.get(&token).copied()
    }
}

/// Animations that finish inside `start_animation` with a fixed outcome.
#[derive(Debug, Clone)]
pub struct ImmediateAnimationFactory {
    outcome: AnimationOutcome,
    starts: Arc<AtomicUsize>,
}

impl ImmediateAnimationFactory {
    pub fn new(outcome: AnimationOutcome) -> Self {
        Self {
            outcome,
            starts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

impl AnimationFactory for ImmediateAnimationFactory {
    fn create(&mut self, _spec: AlphaAnimationSpec) -> Box<dyn AnimationAdapter> {
        Box::new(ImmediateAnimation {
            outcome: self.outcome,
            starts: self.starts.clone(),
        })
    }
}

#[derive(Debug)]
struct ImmediateAnimation {
    outcome: AnimationOutcome,
    starts: Arc<AtomicUsize>,
}

impl AnimationAdapter for ImmediateAnimation {
    fn start_animation(
        &mut self,
        _surface: SurfaceHandle,
        _transaction: &mut dyn Transaction,
        callback: AnimationCallback,
    ) {
        self.starts.fetch_add(1, Ordering::SeqCst);
        callback.finish(self.outcome);
    }
}
