// commands.rs
// Handles processing of SimCommand messages for the simulation

use serde::{Deserialize, Serialize};
use ultraviolet::DVec2;

use crate::error::Result;
use crate::simulation::Simulation;

#[cfg(feature = "profiling")]
use crate::PROFILER;

/// Operations the UI/input layer may request between frames.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimCommand {
    AddParticle {
        pos: DVec2,
        vel: DVec2,
        charge: f64,
        mass: f64,
        radius: f64,
        fixed: bool,
    },
    SelectNear { point: DVec2 },
    AdjustCharge { delta: f64 },
    AdjustMass { delta: f64 },
    AdjustRadius { delta: f64 },
    ToggleFixed,
    RemoveSelected,
    ResetScene,
    Clear,
    StartValidation,
    StopValidation,
    TogglePause,
    SetSpeedIndex { index: usize },
    StepFrame,
    StepOnce,
    SetShowForces { enabled: bool },
    SetTrailsEnabled { enabled: bool },
}

/// Process a single SimCommand
pub fn process_command(cmd: SimCommand, simulation: &mut Simulation) -> Result<()> {
    match cmd {
        SimCommand::AddParticle {
            pos,
            vel,
            charge,
            mass,
            radius,
            fixed,
        } => {
            simulation.add_particle(pos, vel, charge, mass, radius, fixed)?;
        }
        SimCommand::SelectNear { point } => {
            simulation.select_near(point);
        }
        SimCommand::AdjustCharge { delta } => simulation.adjust_selected_charge(delta)?,
        SimCommand::AdjustMass { delta } => simulation.adjust_selected_mass(delta)?,
        SimCommand::AdjustRadius { delta } => simulation.adjust_selected_radius(delta)?,
        SimCommand::ToggleFixed => simulation.toggle_selected_fixed()?,
        SimCommand::RemoveSelected => simulation.remove_selected()?,
        SimCommand::ResetScene => simulation.reset_to_default_scene(),
        SimCommand::Clear => simulation.clear(),
        SimCommand::StartValidation => simulation.start_validation(),
        SimCommand::StopValidation => simulation.stop_validation(),
        SimCommand::TogglePause => simulation.toggle_pause(),
        SimCommand::SetSpeedIndex { index } => simulation.set_speed_index(index)?,
        SimCommand::StepFrame => simulation.step_frame(),
        SimCommand::StepOnce => handle_step_once(simulation),
        SimCommand::SetShowForces { enabled } => {
            simulation.show_forces = enabled;
        }
        SimCommand::SetTrailsEnabled { enabled } => {
            simulation.show_trails = enabled;
        }
    }
    Ok(())
}

fn handle_step_once(simulation: &mut Simulation) {
    simulation.step_once();
    simulation.set_paused(true);
    #[cfg(feature = "profiling")]
    {
        PROFILER.lock().print_and_clear();
    }
}
