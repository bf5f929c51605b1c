use crate::cli::OutputFormat;
use dimmer_core::mock::HeadlessCompositor;
use dimmer_core::{CommandTransaction, SurfaceCommand, SurfaceHandle};
use serde::Serialize;

#[derive(Serialize)]
struct FrameRecord<'a> {
    frame: u64,
    commands: &'a [SurfaceCommand],
    #[serde(skip_serializing_if = "Option::is_none")]
    dim_alpha: Option<f32>,
}

#[derive(Serialize)]
struct SummaryRecord {
    frames: u64,
    live_surfaces: usize,
    dim_layers: Vec<SurfaceHandle>,
}

/// Writes each frame's transaction to stdout.
pub struct FrameOutput {
    format: OutputFormat,
    dim_layers: Vec<SurfaceHandle>,
}

impl FrameOutput {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            dim_layers: Vec::new(),
        }
    }

    /// Prints `transaction`. Empty frames are skipped.
    pub fn frame(&mut self, frame: u64, transaction: &CommandTransaction, dim_alpha: Option<f32>) {
        for command in transaction.commands() {
            if let SurfaceCommand::Show { surface } = command {
                self.dim_layers.push(*surface);
            }
        }
        if transaction.is_empty() {
            return;
        }

        match self.format {
            OutputFormat::Text => {
                for command in transaction.commands() {
                    println!("frame {frame:>4}: {command}");
                }
            }
            OutputFormat::Json => {
                let record = FrameRecord {
                    frame,
                    commands: transaction.commands(),
                    dim_alpha,
                };
                match serde_json::to_string(&record) {
                    Ok(line) => println!("{line}"),
                    Err(e) => log::error!("Failed to serialize frame {frame}: {e}"),
                }
            }
        }
    }

    pub fn summary(&self, frames: u64, compositor: &HeadlessCompositor) {
        let live_surfaces = self
            .dim_layers
            .iter()
            .filter(|surface| compositor.surface(**surface).is_some())
            .count();

        match self.format {
            OutputFormat::Text => {
                println!(
                    "{frames} frames, {} dim layers shown, {live_surfaces} still alive",
                    self.dim_layers.len()
                );
                for surface in &self.dim_layers {
                    if let Some(properties) = compositor.surface(*surface) {
                        println!("  {surface}: alpha {:.3}, blur {}", properties.alpha, properties.blur_radius);
                    }
                }
            }
            OutputFormat::Json => {
                let record = SummaryRecord {
                    frames,
                    live_surfaces,
                    dim_layers: self.dim_layers.clone(),
                };
                match serde_json::to_string(&record) {
                    Ok(line) => println!("{line}"),
                    Err(e) => log::error!("Failed to serialize summary: {e}"),
                }
            }
        }
    }
}
