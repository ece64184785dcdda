// Orchestrator-level tests for Simulation

use super::simulation::{RunState, Simulation};
use crate::config::{self, SimConfig};
use crate::error::SimError;
use ultraviolet::DVec2;

fn empty_sim() -> Simulation {
    let mut sim = Simulation::new(SimConfig::default());
    sim.clear();
    sim
}

#[cfg(test)]
mod scene {
    use super::*;

    #[test]
    fn new_simulation_starts_in_default_scene() {
        let sim = Simulation::default();
        assert_eq!(sim.particles.len(), 1);
        let p = &sim.particles[0];
        assert_eq!(p.pos, DVec2::new(8.0, 5.0));
        assert_eq!(p.charge, -config::DEFAULT_CHARGE_C);
        assert_eq!(p.mass, config::DEFAULT_MASS_KG);
        assert!(!p.fixed);
        assert_eq!(sim.clock(), 0.0);
        assert_eq!(sim.run_state(), RunState::Running);
        assert_eq!(sim.speed_multiplier(), 1.0);
    }

    #[test]
    fn adding_beyond_capacity_is_rejected() {
        let cfg = SimConfig {
            max_particles: 3,
            ..SimConfig::default()
        };
        let mut sim = Simulation::new(cfg);
        for x in [2.0, 4.0] {
            sim.add_particle(DVec2::new(x, 2.0), DVec2::zero(), 1e-6, 0.02, 0.1, false)
                .expect("room left");
        }
        let err = sim.add_particle(DVec2::new(6.0, 2.0), DVec2::zero(), 1e-6, 0.02, 0.1, false);
        assert_eq!(err, Err(SimError::CapacityExceeded { max: 3 }));
        assert_eq!(sim.particles.len(), 3, "Rejected add must leave the scene unchanged");
    }

    #[test]
    fn add_particle_clamps_and_assigns_dense_ids() {
        let mut sim = empty_sim();
        let id = sim
            .add_particle(DVec2::new(1.0, 1.0), DVec2::zero(), 1.0, 5.0, 0.0, false)
            .unwrap();
        assert_eq!(id, 0);
        let p = &sim.particles[0];
        assert_eq!(p.charge, config::MAX_CHARGE_C);
        assert_eq!(p.mass, config::MAX_MASS_KG);
        assert_eq!(p.radius, config::MIN_RADIUS_M);
    }

    #[test]
    fn remove_selected_reassigns_ids() {
        let mut sim = empty_sim();
        for x in [2.0, 6.0, 10.0] {
            sim.add_particle(DVec2::new(x, 5.0), DVec2::zero(), 1e-6, 0.02, 0.1, false)
                .unwrap();
        }
        assert_eq!(sim.select_near(DVec2::new(6.02, 5.0)), Some(1));
        sim.remove_selected().unwrap();
        assert_eq!(sim.particles.iter().map(|p| p.id).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(sim.particles[1].pos, DVec2::new(10.0, 5.0));
        assert_eq!(sim.selected(), None);
        assert_eq!(sim.remove_selected(), Err(SimError::NoSelection));
    }

    #[test]
    fn select_near_respects_pick_margin() {
        let mut sim = empty_sim();
        sim.add_particle(DVec2::new(8.0, 5.0), DVec2::zero(), 1e-6, 0.02, 0.1, false)
            .unwrap();
        // radius 0.1 m + 6 px / 80 px/m = 0.175 m
        assert_eq!(sim.select_near(DVec2::new(8.2, 5.0)), None);
        assert_eq!(sim.select_near(DVec2::new(8.15, 5.0)), Some(0));
        // Across the seam
        sim.add_particle(DVec2::new(0.05, 5.0), DVec2::zero(), 1e-6, 0.02, 0.1, false)
            .unwrap();
        assert_eq!(sim.select_near(DVec2::new(15.98, 5.0)), Some(1));
    }

    #[test]
    fn edits_clamp_and_need_a_selection() {
        let mut sim = Simulation::default();
        assert_eq!(sim.adjust_selected_charge(1e-6), Err(SimError::NoSelection));
        assert_eq!(sim.toggle_selected_fixed(), Err(SimError::NoSelection));

        sim.select_near(DVec2::new(8.0, 5.0));
        sim.adjust_selected_charge(1.0).unwrap();
        sim.adjust_selected_mass(-1.0).unwrap();
        sim.adjust_selected_radius(config::RADIUS_STEP_M).unwrap();
        sim.toggle_selected_fixed().unwrap();
        let p = &sim.particles[0];
        assert_eq!(p.charge, config::MAX_CHARGE_C);
        assert_eq!(p.mass, config::MIN_MASS_KG);
        assert!((p.radius - 0.105).abs() < 1e-12);
        assert!(p.fixed);
    }

    #[test]
    fn clear_resets_clock_and_energies() {
        let mut sim = Simulation::default();
        sim.step_frame();
        assert!(sim.clock() > 0.0);
        sim.clear();
        assert!(sim.particles.is_empty());
        assert_eq!(sim.clock(), 0.0);
        assert_eq!(sim.energies().total, 0.0);
        assert!(sim.last_forces().is_none());
    }
}

#[cfg(test)]
mod stepping {
    use super::*;

    #[test]
    fn paused_frame_is_a_no_op() {
        let mut sim = empty_sim();
        sim.add_particle(DVec2::new(8.0, 5.0), DVec2::new(1.0, 0.0), 1e-6, 0.02, 0.1, false)
            .unwrap();
        sim.toggle_pause();
        sim.step_frame();
        assert_eq!(sim.clock(), 0.0);
        assert_eq!(sim.particles[0].pos, DVec2::new(8.0, 5.0));
        assert_eq!(sim.run_state(), RunState::Paused);

        sim.step_once();
        assert_eq!(sim.substeps_elapsed(), 8);
        assert!(sim.particles[0].pos.x > 8.0);
        assert!(sim.is_paused());
    }

    #[test]
    fn speed_index_scales_substeps() {
        let mut sim = Simulation::default();
        assert_eq!(sim.substeps_per_frame(), 8);
        sim.set_speed_index(3).unwrap();
        assert_eq!(sim.substeps_per_frame(), 32);
        sim.step_frame();
        assert_eq!(sim.substeps_elapsed(), 32);
        sim.set_speed_index(0).unwrap();
        assert_eq!(sim.substeps_per_frame(), 4);
        assert_eq!(sim.set_speed_index(4), Err(SimError::InvalidSpeedIndex(4)));
        assert_eq!(sim.speed_index(), 0);
    }

    #[test]
    fn drift_across_seam_is_wrapped() {
        let mut sim = empty_sim();
        sim.add_particle(DVec2::new(15.99, 9.99), DVec2::new(2.0, 2.0), 1e-6, 0.02, 0.1, false)
            .unwrap();
        sim.step_frame();
        let p = sim.particles[0].pos;
        assert!(p.x >= 0.0 && p.x < 1.0);
        assert!(p.y >= 0.0 && p.y < 1.0);
    }

    #[test]
    fn merge_clears_stale_selection_and_renumbers() {
        let mut sim = empty_sim();
        sim.add_particle(DVec2::new(2.0, 2.0), DVec2::zero(), 1e-6, 0.02, 0.05, true)
            .unwrap();
        sim.add_particle(DVec2::new(8.0, 5.0), DVec2::zero(), 5e-6, 0.02, 0.1, false)
            .unwrap();
        sim.add_particle(DVec2::new(8.1, 5.0), DVec2::zero(), -5e-6, 0.02, 0.1, false)
            .unwrap();
        assert_eq!(sim.select_near(DVec2::new(8.12, 5.0)), Some(2));

        sim.step_frame();

        assert_eq!(sim.particles.len(), 2);
        assert_eq!(sim.particles.iter().map(|p| p.id).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(sim.selected(), None, "Selection pointing past the end must be cleared");
        assert_eq!(sim.diagnostics().merges, 1);
        assert!(sim.particles[1].charge.abs() < 1e-18);
    }

    #[test]
    fn frame_bookkeeping_updates_trails_energies_and_forces() {
        let mut sim = empty_sim();
        sim.show_forces = true;
        sim.add_particle(DVec2::new(7.0, 5.0), DVec2::zero(), 5e-6, 0.02, 0.1, true)
            .unwrap();
        sim.add_particle(DVec2::new(9.0, 5.0), DVec2::zero(), 5e-6, 0.02, 0.1, false)
            .unwrap();
        sim.step_frame();

        let forces = sim.last_forces().expect("forces enabled");
        assert_eq!(forces[0], DVec2::zero());
        assert!(forces[1].x > 0.0);

        let e = sim.energies();
        assert!(e.potential > 0.0);
        assert!(e.kinetic > 0.0);
        assert!((e.total - (e.kinetic + e.potential)).abs() < 1e-15);

        assert_eq!(sim.particles[1].trail.len(), 1);
        // 8 ms frames against a 1/60 s sampling interval
        sim.step_frame();
        sim.step_frame();
        assert_eq!(sim.particles[1].trail.len(), 1);
        sim.step_frame();
        assert_eq!(sim.particles[1].trail.len(), 2);
    }

    #[test]
    fn disabled_trails_are_left_untouched() {
        let mut sim = Simulation::default();
        sim.show_trails = false;
        for _ in 0..5 {
            sim.step_frame();
        }
        assert!(sim.particles[0].trail.is_empty());
    }
}

#[cfg(test)]
mod validation {
    use super::*;
    use crate::simulation::validation::ValidationPhase;

    #[test]
    fn uniform_field_run_matches_closed_form() {
        let mut sim = Simulation::default();
        sim.start_validation();
        assert_eq!(sim.run_state(), RunState::ValidationRunning);
        assert_eq!(sim.uniform_field_override(), Some(DVec2::new(500.0, 0.0)));
        assert!((sim.validation().acceleration().x - 0.125).abs() < 1e-15);

        let mut frames = 0;
        while !sim.is_paused() && frames < 5000 {
            sim.step_frame();
            frames += 1;
        }
        assert_eq!(frames, 1250);
        assert_eq!(sim.run_state(), RunState::ValidationFinished);

        let outcome = *sim.validation().outcome().expect("terminal snapshot");
        assert!((outcome.time - 10.0).abs() < 1e-9);
        assert!((outcome.theory_pos.x - 14.25).abs() < 1e-9);
        assert!(outcome.pos_error < 1e-3, "position error {}", outcome.pos_error);
        assert!((sim.particles[0].pos.x - 14.25).abs() < 1e-3);

        // Further frames never touch the terminal snapshot
        sim.step_frame();
        sim.step_once();
        assert_eq!(*sim.validation().outcome().unwrap(), outcome);
        assert_eq!(sim.validation().phase(), ValidationPhase::Finished);
    }

    #[test]
    fn stop_restores_pause_flag_and_field() {
        let mut sim = Simulation::default();
        sim.set_paused(true);
        sim.start_validation();
        assert!(!sim.is_paused());
        sim.step_frame();

        sim.stop_validation();
        assert!(sim.is_paused());
        assert_eq!(sim.uniform_field_override(), None);
        assert!(!sim.validation().is_active());
        assert_eq!(sim.run_state(), RunState::Paused);
    }

    #[test]
    fn missing_probe_does_not_stop_stepping() {
        let mut sim = Simulation::default();
        sim.start_validation();
        sim.clear();
        sim.step_frame();
        sim.step_frame();
        assert_eq!(sim.substeps_elapsed(), 16);
        assert_eq!(sim.validation().phase(), ValidationPhase::Running);
        assert!(sim.validation().outcome().is_none());
    }

    #[test]
    fn validation_probe_is_selected_at_centre() {
        let mut sim = Simulation::default();
        sim.start_validation();
        assert_eq!(sim.particles.len(), 1);
        assert_eq!(sim.selected(), Some(0));
        assert_eq!(sim.particles[0].pos, sim.world.center());
        assert_eq!(sim.particles[0].charge, config::DEFAULT_CHARGE_C);
    }

    #[test]
    fn validation_respects_particle_cap() {
        let cfg = SimConfig {
            max_particles: 0,
            ..SimConfig::default()
        };
        let mut sim = Simulation::new(cfg);
        sim.start_validation();
        assert!(sim.particles.is_empty());
        assert!(!sim.validation().is_active());
        assert_eq!(sim.uniform_field_override(), None);
        assert_eq!(sim.run_state(), RunState::Running);
    }
}

#[cfg(test)]
mod field {
    use super::*;
    use crate::field::SamplerCache;

    #[test]
    fn sampler_follows_validation_override() {
        let mut sim = Simulation::default();
        let mut cache = SamplerCache::new(sim.config.sampler_cache_capacity);
        let before: Vec<_> = sim.sample_field(&mut cache).iter().map(|p| p.field).collect();
        assert!(before.iter().any(|e| e.x != 500.0));

        sim.start_validation();
        let sampler = sim.sample_field(&mut cache);
        assert!(sampler.iter().all(|p| p.field == DVec2::new(500.0, 0.0)));
        assert_eq!(cache.len(), 1);

        sim.stop_validation();
        assert!(sim.sample_field(&mut cache).iter().all(|p| p.field != DVec2::new(500.0, 0.0)));
    }
}
