use crate::container::GeometrySnapshot;
use crate::geometry::{Bounds, Position};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How the area covered by the dim is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum DimMode {
    /// Dim the enclosing task, unless the owner sits in an embedded fragment that opts out of
    /// dimming its parent task, in which case only that fragment is dimmed.
    #[default]
    WholeTask,
    /// Dim exactly the bounds of the container that owns the dim position.
    PerContainer,
}

/// Where the dim layer ends up for one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedBounds {
    /// Absolute bounds covered by the dim.
    pub bounds: Bounds,
    /// Position of the layer in its parent's coordinate space.
    pub position: Position,
}

impl ResolvedBounds {
    fn absolute(bounds: Bounds) -> Self {
        Self {
            bounds,
            position: Position::default(),
        }
    }

    fn relative(bounds: Bounds, origin: &Position) -> Self {
        Self {
            bounds,
            position: bounds.relative_to(origin),
        }
    }
}

/// Resolves the dim bounds for `owner`. Without an owner the dim covers the host.
pub fn resolve_dim_bounds(
    mode: DimMode,
    owner: Option<&GeometrySnapshot>,
    host_bounds: &Bounds,
) -> ResolvedBounds {
    let Some(owner) = owner else {
        return ResolvedBounds::absolute(*host_bounds);
    };

    match mode {
        DimMode::WholeTask => {
            let Some(task_bounds) = owner.task_bounds else {
                return ResolvedBounds::absolute(*host_bounds);
            };
            match owner.fragment {
                Some(fragment) if fragment.embedded && !fragment.dims_on_parent_task => {
                    ResolvedBounds::relative(fragment.bounds, &task_bounds.position)
                }
                _ => ResolvedBounds::absolute(task_bounds),
            }
        }
        DimMode::PerContainer => {
            let origin = owner
                .task_bounds
                .map(|task| task.position)
                .unwrap_or(host_bounds.position);
            ResolvedBounds::relative(owner.bounds, &origin)
        }
    }
}
