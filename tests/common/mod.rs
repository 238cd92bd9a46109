pub mod macros;

use hecs::Entity;
use symbiolab_core::config::AppConfig;
use symbiolab_core::world::World;
use symbiolab_data::Program;

#[allow(dead_code)]
pub struct WorldBuilder {
    config: AppConfig,
    hosts: Vec<(usize, Program)>,
    symbionts: Vec<(usize, Program)>,
}

/// Handles to everything a [`WorldBuilder`] placed, in insertion order.
#[allow(dead_code)]
pub struct Placed {
    pub hosts: Vec<Entity>,
    pub symbionts: Vec<Entity>,
}

#[allow(dead_code)]
impl WorldBuilder {
    /// A small, single-threaded, mutation-free world with no ancestors.
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.world.width = 10;
        config.world.height = 10;
        config.world.initial_hosts = 0;
        config.world.initial_symbionts = 0;
        config.world.seed = Some(0);
        config.hardware.thread_count = 1;
        config.reproduction.host_mutation_rate = 0.0;
        config.reproduction.sym_mutation_rate = 0.0;
        Self {
            config,
            hosts: Vec::new(),
            symbionts: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.world.seed = Some(seed);
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn with_host(mut self, slot: usize, program: Program) -> Self {
        self.hosts.push((slot, program));
        self
    }

    /// Adds a symbiont to the host placed at `slot`.
    pub fn with_symbiont(mut self, slot: usize, program: Program) -> Self {
        self.symbionts.push((slot, program));
        self
    }

    pub fn build(self) -> World {
        self.build_placed().0
    }

    pub fn build_placed(self) -> (World, Placed) {
        let mut world = World::new(self.config).expect("Failed to create world");
        let mut placed = Placed {
            hosts: Vec::new(),
            symbionts: Vec::new(),
        };
        for (slot, program) in self.hosts {
            placed
                .hosts
                .push(world.add_host(slot, program).expect("Failed to add host"));
        }
        for (slot, program) in self.symbionts {
            placed
                .symbionts
                .push(world.add_symbiont(slot, program).expect("Failed to add symbiont"));
        }
        (world, placed)
    }
}
