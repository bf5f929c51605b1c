use dimmer_core::mock::HeadlessCompositor;
use dimmer_core::{
    Bounds, CommandTransaction, Container, DimHost, Dimmer, DimmerError, DimmerResult,
    TaskFragmentInfo,
};
use indexmap::IndexMap;
use log::{debug, trace};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Rectangle written as `[x, y, width, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Rect(pub i32, pub i32, pub u32, pub u32);

impl From<Rect> for Bounds {
    fn from(rect: Rect) -> Self {
        Bounds::new(rect.0, rect.1, rect.2, rect.3)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContainerSpec {
    pub bounds: Rect,
    #[serde(default)]
    pub task: Option<Rect>,
    #[serde(default)]
    pub fragment: Option<FragmentSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FragmentSpec {
    pub bounds: Rect,
    #[serde(default = "default_true")]
    pub embedded: bool,
    #[serde(default)]
    pub dims_on_parent_task: bool,
}

fn default_true() -> bool {
    true
}

fn default_hold() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct DimRequest {
    pub requester: String,
    pub alpha: f32,
    #[serde(default)]
    pub blur: i32,
    /// Container whose bounds the dim covers. Defaults to the requester
    #[serde(default)]
    pub bounds_owner: Option<String>,
    /// Container the dim is layered against. Defaults to the requester
    #[serde(default)]
    pub layer: Option<String>,
}

/// One step of the scenario, repeated for `hold` frames.
#[derive(Debug, Clone, Deserialize)]
pub struct PassSpec {
    #[serde(default)]
    pub dim: Option<DimRequest>,
    /// Later requests in the same pass win over `dim`
    #[serde(default)]
    pub also: Vec<DimRequest>,
    #[serde(default)]
    pub host_bounds: Option<Rect>,
    #[serde(default)]
    pub move_container: Option<MoveSpec>,
    #[serde(default)]
    pub dont_animate_exit: bool,
    #[serde(default = "default_hold")]
    pub hold: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveSpec {
    pub name: String,
    pub bounds: Rect,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub host_bounds: Rect,
    #[serde(default)]
    pub containers: IndexMap<String, ContainerSpec>,
    pub passes: Vec<PassSpec>,
}

impl Scenario {
    pub fn load(path: &Path) -> DimmerResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            DimmerError::Scenario(format!("Failed to read '{}': {e}", path.display()))
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> DimmerResult<Self> {
        let scenario: Scenario = serde_yaml::from_str(contents)
            .map_err(|e| DimmerError::Scenario(format!("Failed to parse scenario: {e}")))?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> DimmerResult<()> {
        if self.passes.is_empty() {
            return Err(DimmerError::Scenario("scenario has no passes".into()));
        }

        for (index, pass) in self.passes.iter().enumerate() {
            let requests = pass.dim.iter().chain(pass.also.iter());
            let names = requests.flat_map(|request| {
                [
                    Some(&request.requester),
                    request.bounds_owner.as_ref(),
                    request.layer.as_ref(),
                ]
            });
            let moved = pass.move_container.as_ref().map(|m| &m.name);

            for name in names.chain([moved]).flatten() {
                if !self.containers.contains_key(name) {
                    return Err(DimmerError::Scenario(format!(
                        "pass {index} refers to unknown container '{name}'"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn frame_count(&self) -> u64 {
        self.passes.iter().map(|p| p.hold.max(1) as u64).sum()
    }
}

/// Plays a scenario one frame at a time.
pub struct ScenarioPlayer {
    scenario: Scenario,
    containers: IndexMap<String, Container>,
    pass_index: usize,
    frames_left_in_pass: u32,
}

impl ScenarioPlayer {
    /// Creates the scenario's containers, each with its own surface in `compositor`.
    pub fn new(scenario: Scenario, compositor: &mut HeadlessCompositor) -> Self {
        let containers = scenario
            .containers
            .iter()
            .map(|(name, spec)| {
                let mut container = Container::new(name.clone(), spec.bounds.into())
                    .with_surface(compositor.allocate());
                container.set_task_bounds(spec.task.map(Bounds::from));
                container.set_fragment(spec.fragment.as_ref().map(|f| TaskFragmentInfo {
                    bounds: f.bounds.into(),
                    embedded: f.embedded,
                    dims_on_parent_task: f.dims_on_parent_task,
                }));
                (name.clone(), container)
            })
            .collect();

        let frames_left_in_pass = scenario.passes.first().map_or(0, |p| p.hold.max(1));
        Self {
            scenario,
            containers,
            pass_index: 0,
            frames_left_in_pass,
        }
    }

    pub fn host_bounds(&self) -> Bounds {
        self.scenario.host_bounds.into()
    }

    pub fn is_finished(&self) -> bool {
        self.pass_index >= self.scenario.passes.len()
    }

    /// Runs the current pass for one frame. Returns `false` once every pass has been played.
    pub fn play_frame<H>(&mut self, dimmer: &mut Dimmer<H>, transaction: &mut CommandTransaction) -> bool
    where
        H: DimHost + HostBounds,
    {
        let Some(pass) = self.scenario.passes.get(self.pass_index) else {
            return false;
        };
        let first_frame = self.frames_left_in_pass == pass.hold.max(1);

        if first_frame {
            debug!("Starting pass {}", self.pass_index);
            if let Some(bounds) = pass.host_bounds {
                dimmer.host_mut().set_bounds(bounds.into());
            }
            if let Some(movement) = &pass.move_container {
                if let Some(container) = self.containers.get_mut(&movement.name) {
                    container.set_bounds(movement.bounds.into());
                }
            }
            if pass.dont_animate_exit {
                dimmer.dont_animate_exit();
            }
        }

        dimmer.reset_dim_states();
        for request in pass.dim.iter().chain(pass.also.iter()) {
            let (Some(requester), Some(owner), Some(layer)) = (
                self.containers.get(&request.requester),
                self.containers
                    .get(request.bounds_owner.as_ref().unwrap_or(&request.requester)),
                self.containers
                    .get(request.layer.as_ref().unwrap_or(&request.requester)),
            ) else {
                continue;
            };
            trace!(
                "{} requests alpha {} blur {}",
                requester.name(),
                request.alpha,
                request.blur
            );
            dimmer.adjust_appearance(requester, request.alpha, request.blur);
            dimmer.adjust_position(owner, layer);
        }
        dimmer.update_dims(transaction);

        self.frames_left_in_pass = self.frames_left_in_pass.saturating_sub(1);
        if self.frames_left_in_pass == 0 {
            self.pass_index += 1;
            self.frames_left_in_pass = self
                .scenario
                .passes
                .get(self.pass_index)
                .map_or(0, |p| p.hold.max(1));
        }
        true
    }
}

/// Hosts whose bounds a scenario can change.
pub trait HostBounds {
    fn set_bounds(&mut self, bounds: Bounds);
}

impl HostBounds for dimmer_core::mock::HeadlessHost {
    fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }
}
