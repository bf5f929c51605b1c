use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a compositor surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceHandle(pub u64);

impl fmt::Display for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// A batch of surface mutations that the compositor applies atomically.
///
/// Nothing recorded here takes effect until the owner of the transaction applies it.
pub trait Transaction {
    fn set_alpha(&mut self, surface: SurfaceHandle, alpha: f32);
    fn set_window_crop(&mut self, surface: SurfaceHandle, width: u32, height: u32);
    fn set_position(&mut self, surface: SurfaceHandle, x: i32, y: i32);
    fn set_background_blur_radius(&mut self, surface: SurfaceHandle, radius: u32);
    /// Layers `surface` at `z` relative to `relative_to`.
    fn set_relative_layer(&mut self, surface: SurfaceHandle, relative_to: SurfaceHandle, z: i32);
    fn show(&mut self, surface: SurfaceHandle);
    fn remove(&mut self, surface: SurfaceHandle);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SurfaceCommand {
    SetAlpha {
        surface: SurfaceHandle,
        alpha: f32,
    },
    SetWindowCrop {
        surface: SurfaceHandle,
        width: u32,
        height: u32,
    },
    SetPosition {
        surface: SurfaceHandle,
        x: i32,
        y: i32,
    },
    SetBackgroundBlurRadius {
        surface: SurfaceHandle,
        radius: u32,
    },
    SetRelativeLayer {
        surface: SurfaceHandle,
        relative_to: SurfaceHandle,
        z: i32,
    },
    Show {
        surface: SurfaceHandle,
    },
    Remove {
        surface: SurfaceHandle,
    },
}

impl SurfaceCommand {
    pub fn surface(&self) -> SurfaceHandle {
        match self {
            SurfaceCommand::SetAlpha { surface, .. }
            | SurfaceCommand::SetWindowCrop { surface, .. }
            | SurfaceCommand::SetPosition { surface, .. }
            | SurfaceCommand::SetBackgroundBlurRadius { surface, .. }
            | SurfaceCommand::SetRelativeLayer { surface, .. }
            | SurfaceCommand::Show { surface }
            | SurfaceCommand::Remove { surface } => *surface,
        }
    }
}

impl fmt::Display for SurfaceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceCommand::SetAlpha { surface, alpha } => {
                write!(f, "set_alpha({surface}, {alpha:.3})")
            }
            SurfaceCommand::SetWindowCrop {
                surface,
                width,
                height,
            } => write!(f, "set_window_crop({surface}, {width}x{height})"),
            SurfaceCommand::SetPosition { surface, x, y } => {
                write!(f, "set_position({surface}, {x}, {y})")
            }
            SurfaceCommand::SetBackgroundBlurRadius { surface, radius } => {
                write!(f, "set_background_blur_radius({surface}, {radius})")
            }
            SurfaceCommand::SetRelativeLayer {
                surface,
                relative_to,
                z,
            } => write!(f, "set_relative_layer({surface}, {relative_to}, {z})"),
            SurfaceCommand::Show { surface } => write!(f, "show({surface})"),
            SurfaceCommand::Remove { surface } => write!(f, "remove({surface})"),
        }
    }
}

/// Transaction that records its commands in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandTransaction {
    commands: Vec<SurfaceCommand>,
}

impl CommandTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[SurfaceCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&SurfaceCommand) -> bool,
    {
        self.commands.iter().filter(|c| predicate(c)).count()
    }

    pub fn contains(&self, command: &SurfaceCommand) -> bool {
        self.commands.contains(command)
    }

    /// The last alpha written for `surface`, if any.
    pub fn last_alpha(&self, surface: SurfaceHandle) -> Option<f32> {
        self.commands.iter().rev().find_map(|c| match c {
            SurfaceCommand::SetAlpha { surface: s, alpha } if *s == surface => Some(*alpha),
            _ => None,
        })
    }
}

impl IntoIterator for CommandTransaction {
    type Item = SurfaceCommand;
    type IntoIter = std::vec::IntoIter<SurfaceCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

impl Transaction for CommandTransaction {
    fn set_alpha(&mut self, surface: SurfaceHandle, alpha: f32) {
        self.commands.push(SurfaceCommand::SetAlpha { surface, alpha });
    }

    fn set_window_crop(&mut self, surface: SurfaceHandle, width: u32, height: u32) {
        self.commands.push(SurfaceCommand::SetWindowCrop {
            surface,
            width,
            height,
        });
    }

    fn set_position(&mut self, surface: SurfaceHandle, x: i32, y: i32) {
        self.commands
            .push(SurfaceCommand::SetPosition { surface, x, y });
    }

    fn set_background_blur_radius(&mut self, surface: SurfaceHandle, radius: u32) {
        self.commands
            .push(SurfaceCommand::SetBackgroundBlurRadius { surface, radius });
    }

    fn set_relative_layer(&mut self, surface: SurfaceHandle, relative_to: SurfaceHandle, z: i32) {
        self.commands.push(SurfaceCommand::SetRelativeLayer {
            surface,
            relative_to,
            z,
        });
    }

    fn show(&mut self, surface: SurfaceHandle) {
        self.commands.push(SurfaceCommand::Show { surface });
    }

    fn remove(&mut self, surface: SurfaceHandle) {
        self.commands.push(SurfaceCommand::Remove { surface });
    }
}

/// Applies transactions to whatever actually displays the surfaces.
pub trait Compositor: Send {
    fn apply(&mut self, transaction: CommandTransaction);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let surface = SurfaceHandle(1);
        let mut t = CommandTransaction::new();
        t.show(surface);
        t.set_alpha(surface, 0.5);
        t.remove(surface);

        assert_eq!(
            t.commands(),
            &[
                SurfaceCommand::Show { surface },
                SurfaceCommand::SetAlpha {
                    surface,
                    alpha: 0.5
                },
                SurfaceCommand::Remove { surface },
            ]
        );
    }

    #[test]
    fn test_last_alpha_per_surface() {
        let a = SurfaceHandle(1);
        let b = SurfaceHandle(2);
        let mut t = CommandTransaction::new();
        t.set_alpha(a, 0.1);
        t.set_alpha(b, 0.2);
        t.set_alpha(a, 0.3);

        assert_eq!(t.last_alpha(a), Some(0.3));
        assert_eq!(t.last_alpha(b), Some(0.2));
        assert_eq!(t.last_alpha(SurfaceHandle(9)), None);
    }

    #[test]
    fn test_command_display() {
        let command = SurfaceCommand::SetWindowCrop {
            surface: SurfaceHandle(4),
            width: 100,
            height: 300,
        };
        assert_eq!(command.to_string(), "set_window_crop(surface#4, 100x300)");
    }

    #[test]
    fn test_serializes_with_op_tag() {
        let command = SurfaceCommand::Show {
            surface: SurfaceHandle(7),
        };
        let json = serde_json::to_string(&command).unwrap();
        assert_eq!(json, r#"{"op":"show","surface":7}"#);
    }
}
