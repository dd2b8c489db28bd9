//! Schedule command: show the parameters a strength maps to.
//!
//! # Usage
//!
//! ```bash
//! vectorpusher schedule --strength 0.5
//! vectorpusher schedule --strength 0.5 --branch g
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tracing::info;

use vectorpusher_core::blender::ScaleVariant;
use vectorpusher_core::{params_summary, MultiScaleBlender, Schedule, ScheduleMapper};

use super::{emit, load_config};

/// Arguments for the schedule command.
#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Sculpting strength in [0, 1]
    #[arg(long)]
    pub strength: f32,

    /// Branch whose strength multiplier applies
    #[arg(long)]
    pub branch: Option<String>,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Schedule command output.
#[derive(Debug, Serialize)]
pub struct ScheduleReport {
    pub params: String,
    pub strength: f32,
    pub branch: Option<String>,
    pub branch_strength: f32,
    pub schedule: Schedule,
    pub variants: Vec<ScaleVariant>,
}

/// Build the schedule report for `args`.
pub fn run_schedule(args: &ScheduleArgs) -> Result<ScheduleReport> {
    let config = load_config(args.config.as_deref())?;
    let branch_strength = match &args.branch {
        Some(branch) => config.branches.branch_strength(branch, args.strength),
        None => args.strength.clamp(0.0, 1.0),
    };
    let schedule = ScheduleMapper::new(config.schedule.clone()).map(branch_strength);
    let variants = MultiScaleBlender::new(config.blend.clone()).variants(&schedule);
    info!(branch_strength, k = schedule.k, "Derived schedule");

    Ok(ScheduleReport {
        params: params_summary(args.strength),
        strength: args.strength,
        branch: args.branch.clone(),
        branch_strength,
        schedule,
        variants,
    })
}

/// Execute the schedule command.
///
/// # Returns
///
/// Exit code:
/// - 0: Success
/// - 1: Invalid configuration
pub fn handle_schedule(args: ScheduleArgs) -> i32 {
    emit(run_schedule(&args))
}
