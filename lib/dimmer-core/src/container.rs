use crate::geometry::Bounds;
use crate::surface::SurfaceHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a container that can request or position the dim.
///
/// Two containers with identical geometry still get different ids, so ids are what the dimmer
/// compares to detect an ownership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(u64);

static ID_COUNTER: AtomicU64 = AtomicU64::new(1);

impl ContainerId {
    pub fn next() -> Self {
        Self(ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container#{}", self.0)
    }
}

/// The task fragment a container lives in when several fragments share one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFragmentInfo {
    pub bounds: Bounds,
    /// Whether the fragment is embedded next to other fragments in its task.
    #[serde(default = "default_embedded")]
    pub embedded: bool,
    /// Whether a dim requested inside this fragment should cover the whole task.
    #[serde(default)]
    pub dims_on_parent_task: bool,
}

fn default_embedded() -> bool {
    true
}

/// What the dimmer needs to know about a window or container.
pub trait DimContainer {
    fn id(&self) -> ContainerId;

    /// The container's own surface, used as the anchor for relative layering.
    fn surface(&self) -> Option<SurfaceHandle>;

    fn bounds(&self) -> Bounds;

    /// Bounds of the enclosing task, if the container belongs to one.
    fn task_bounds(&self) -> Option<Bounds> {
        None
    }

    fn task_fragment(&self) -> Option<TaskFragmentInfo> {
        None
    }
}

/// Geometry of a bounds owner, captured when it is handed to the dimmer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometrySnapshot {
    pub owner: ContainerId,
    pub bounds: Bounds,
    pub task_bounds: Option<Bounds>,
    pub fragment: Option<TaskFragmentInfo>,
}

impl GeometrySnapshot {
    pub fn capture(container: &dyn DimContainer) -> Self {
        Self {
            owner: container.id(),
            bounds: container.bounds(),
            task_bounds: container.task_bounds(),
            fragment: container.task_fragment(),
        }
    }
}

/// Plain in-memory container.
#[derive(Debug)]
pub struct Container {
    id: ContainerId,
    name: String,
    surface: Option<SurfaceHandle>,
    bounds: Bounds,
    task_bounds: Option<Bounds>,
    fragment: Option<TaskFragmentInfo>,
}

impl Container {
    pub fn new(name: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            id: ContainerId::next(),
            name: name.into(),
            surface: None,
            bounds,
            task_bounds: None,
            fragment: None,
        }
    }

    pub fn with_surface(mut self, surface: SurfaceHandle) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn in_task(mut self, task_bounds: Bounds) -> Self {
        self.task_bounds = Some(task_bounds);
        self
    }

    pub fn in_fragment(mut self, fragment: TaskFragmentInfo) -> Self {
        self.fragment = Some(fragment);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    pub fn set_task_bounds(&mut self, task_bounds: Option<Bounds>) {
        self.task_bounds = task_bounds;
    }

    pub fn set_fragment(&mut self, fragment: Option<TaskFragmentInfo>) {
        self.fragment = fragment;
    }
}

impl DimContainer for Container {
    fn id(&self) -> ContainerId {
        self.id
    }

    fn surface(&self) -> Option<SurfaceHandle> {
        self.surface
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn task_bounds(&self) -> Option<Bounds> {
        self.task_bounds
    }

    fn task_fragment(&self) -> Option<TaskFragmentInfo> {
        self.fragment
    }
}
