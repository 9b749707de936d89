//! Run lifecycle: start, stop, restart
//!
//! A run owns exactly one world. Stopping tears the world down, pending
//! infections included, before anything else can start.

use super::world::{PopulationSummary, World};
use crate::config::SimConfig;
use crate::error::Result;

pub struct SimController {
    config: SimConfig,
    world: Option<World>,
    /// Runs started so far; offsets the seed so restarts differ
    runs: u64,
}

impl SimController {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            world: None,
            runs: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.world.is_some()
    }

    /// Build a fresh world; false (and a warning) if one is already running
    pub fn start(&mut self) -> Result<bool> {
        if self.is_running() {
            log::warn!("Simulation already running");
            return Ok(false);
        }

        let mut config = self.config.clone();
        config.seed = config.seed.wrapping_add(self.runs);
        let world = World::new(config)?;
        self.runs += 1;
        self.world = Some(world);
        log::info!("Run {} started", self.runs);
        Ok(true)
    }

    /// Tear down the running world; false (and a warning) if idle
    pub fn stop(&mut self) -> bool {
        match self.world.take() {
            Some(mut world) => {
                world.teardown();
                log::info!("Run {} stopped after {} ticks", self.runs, world.ticks());
                true
            }
            None => {
                log::warn!("Simulation not running");
                false
            }
        }
    }

    /// Stop (if running) then start
    pub fn restart(&mut self) -> Result<bool> {
        if self.is_running() {
            self.stop();
        }
        self.start()
    }

    /// Advance the running world by one tick; false when idle
    pub fn tick(&mut self) -> bool {
        match self.world.as_mut() {
            Some(world) => {
                world.tick();
                true
            }
            None => false,
        }
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn world_mut(&mut self) -> Option<&mut World> {
        self.world.as_mut()
    }

    pub fn summary(&self) -> Option<PopulationSummary> {
        self.world.as_ref().map(World::summary)
    }

    pub fn runs(&self) -> u64 {
        self.runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimConfig {
        SimConfig {
            pop_count: 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_start_twice_is_refused() {
        let mut controller = SimController::new(small_config());
        assert!(controller.start().unwrap());
        assert!(!controller.start().unwrap());
        assert_eq!(controller.runs(), 1);
    }

    #[test]
    fn test_stop_when_idle_is_refused() {
        let mut controller = SimController::new(small_config());
        assert!(!controller.stop());
        assert!(!controller.tick());
    }

    #[test]
    fn test_restart_builds_new_world() {
        let mut controller = SimController::new(small_config());
        controller.start().unwrap();
        for _ in 0..10 {
            controller.tick();
        }
        assert_eq!(controller.world().unwrap().ticks(), 10);

        assert!(controller.restart().unwrap());
        assert_eq!(controller.world().unwrap().ticks(), 0);
        assert_eq!(controller.world().unwrap().config().seed, small_config().seed + 1);
        assert_eq!(controller.runs(), 2);
    }

    #[test]
    fn test_invalid_config_does_not_start() {
        let mut config = small_config();
        config.arena_width = 0.0;
        let mut controller = SimController::new(config);
        assert!(controller.start().is_err());
        assert!(!controller.is_running());
    }
}
