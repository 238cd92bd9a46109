use symbiolab_core::config::{AppConfig, SymbiontType};
use symbiolab_core::world::World;
use symbiolab_data::Checkpoint;

fn seeded_config(seed: u64) -> AppConfig {
    let mut config = AppConfig::default();
    config.world.seed = Some(seed);
    config.world.width = 12;
    config.world.height = 12;
    config.world.initial_hosts = 60;
    config.world.initial_symbionts = 30;
    config.hardware.thread_count = 1;
    config.hardware.cycles_per_update = 30;
    config.symbiosis.symbiont_type = SymbiontType::Mutualist;
    config.reproduction.host_mutation_rate = 0.002;
    config.reproduction.sym_mutation_rate = 0.002;
    config
}

fn run(config: AppConfig, ticks: u64) -> (Checkpoint, u64) {
    let mut world = World::new(config).unwrap();
    world.populate().unwrap();
    world.run(ticks);
    let hosts = world.population().num_hosts() as u64;
    (world.checkpoint(), hosts)
}

#[test]
fn test_determinism_consistency() {
    let (first, hosts1) = run(seeded_config(12345), 150);
    let (second, hosts2) = run(seeded_config(12345), 150);

    assert_eq!(hosts1, hosts2, "Host counts should match");
    assert_eq!(first, second, "Recorded series should match");
    assert!(first.total("births") > 0.0, "The run should not be static");
}

#[test]
fn test_seed_drives_the_run() {
    let (first, _) = run(seeded_config(1), 150);
    let (second, _) = run(seeded_config(2), 150);
    assert_ne!(first, second);
}

#[test]
fn test_populate_respects_counts() {
    let mut world = World::new(seeded_config(7)).unwrap();
    world.populate().unwrap();
    assert_eq!(world.population().num_hosts(), 60);
    assert_eq!(world.population().num_symbionts(), 30);
    assert_eq!(world.seed(), 7);
}
