mod common;

use common::WorldBuilder;
use symbiolab_core::cpu::builder::{not_program, ProgramBuilder};
use symbiolab_data::{Program, PROGRAM_LENGTH};

/// A NOT host that earns 5 points per tick and may reproduce on 4.
fn breeding_world() -> WorldBuilder {
    WorldBuilder::new().with_config(|c| {
        c.world.width = 3;
        c.world.height = 3;
        c.hardware.cycles_per_update = 100;
        c.hardware.random_io_input = false;
        c.tasks.limited_task_reset_interval = 1;
        c.reproduction.host_repro_res = 4.0;
    })
}

#[test]
fn test_host_reproduces_into_another_slot() {
    let (mut world, placed) = breeding_world()
        .with_host(4, not_program(PROGRAM_LENGTH))
        .build_placed();
    let parent = placed.hosts[0];

    world.update();

    assert_population!(world, 2, 0);
    assert_points!(world, parent, 1.0);
    assert!(world.repro_queue().is_empty());
    assert_eq!(world.organism(parent).unwrap().cpu.state.repro_slot(), None);

    let child = world
        .population()
        .occupied()
        .map(|(_, e)| e)
        .find(|&e| e != parent)
        .unwrap();
    {
        let child = world.organism(child).unwrap();
        assert_eq!(child.points, 0.0);
        assert_eq!(child.age, 0);
        assert_eq!(child.cpu.program(), &not_program(PROGRAM_LENGTH));
    }
    assert_eq!(world.checkpoint().total("births"), 1.0);
}

#[test]
fn test_points_must_exceed_cost() {
    let mut world = breeding_world()
        .with_config(|c| c.reproduction.host_repro_res = 5.0)
        .with_host(0, not_program(PROGRAM_LENGTH))
        .build();

    // 5 points is not more than 5.
    world.update();
    assert_population!(world, 1, 0);
    // 10 is.
    world.update();
    assert_population!(world, 2, 0);
}

#[test]
fn test_minimum_cycles_delay_reproduction() {
    let mut world = breeding_world()
        .with_config(|c| c.reproduction.host_min_cycles_before_repro = 150)
        .with_host(0, not_program(PROGRAM_LENGTH))
        .build();

    world.update();
    assert_population!(world, 1, 0);
    world.update();
    assert_population!(world, 2, 0);
}

#[test]
fn test_killed_organism_never_reproduces() {
    let (mut world, placed) = breeding_world()
        .with_host(0, not_program(PROGRAM_LENGTH))
        .build_placed();
    let parent = placed.hosts[0];

    world.run_cpu_phase();
    let index = world
        .organism(parent)
        .and_then(|o| o.cpu.state.repro_slot())
        .expect("host should have queued a birth");
    assert_eq!(world.repro_queue().get(index).map(|e| e.valid), Some(true));

    assert!(world.kill(parent));
    assert_eq!(world.repro_queue().get(index).map(|e| e.valid), Some(false));

    assert_eq!(world.drain_reproduction(), 0);
    assert!(world.repro_queue().is_empty());
    assert_eq!(world.population().num_hosts(), 1, "slot is only vacated by the sweep");

    world.update();
    assert_gone!(world, parent);
    assert_population!(world, 0, 0);
}

#[test]
fn test_vertical_transmission_copies_symbiont() {
    let (mut world, placed) = breeding_world()
        .with_config(|c| {
            c.reproduction.vertical_transmission = 1.0;
            c.reproduction.sym_vert_trans_res = 0.0;
        })
        .with_host(0, not_program(PROGRAM_LENGTH))
        .with_symbiont(0, Program::blank(PROGRAM_LENGTH))
        .build_placed();
    let parent = placed.hosts[0];

    world.update();
    assert_population!(world, 2, 2);

    let child = world
        .population()
        .occupied()
        .map(|(_, e)| e)
        .find(|&e| e != parent)
        .unwrap();
    let offspring = world.organism(child).unwrap().symbionts[0];
    assert_eq!(world.organism(offspring).unwrap().host, Some(child));

    let checkpoint = world.checkpoint();
    assert_eq!(checkpoint.total("vertical_attempts"), 1.0);
    assert_eq!(checkpoint.total("vertical_successes"), 1.0);
    assert_eq!(checkpoint.total("births"), 2.0);
}

#[test]
fn test_vertical_transmission_can_fail() {
    let mut world = breeding_world()
        .with_config(|c| {
            c.reproduction.vertical_transmission = 1.0;
            c.reproduction.sym_vert_trans_res = 3.0;
        })
        .with_host(0, not_program(PROGRAM_LENGTH))
        .with_symbiont(0, Program::blank(PROGRAM_LENGTH))
        .build();

    // The symbiont never earns, so it cannot pay.
    world.update();
    assert_population!(world, 2, 1);
    let checkpoint = world.checkpoint();
    assert_eq!(checkpoint.total("vertical_attempts"), 1.0);
    assert_eq!(checkpoint.total("vertical_successes"), 0.0);
}

#[test]
fn test_horizontal_transmission_fills_free_host() {
    let (mut world, placed) = WorldBuilder::new()
        .with_seed(21)
        .with_config(|c| {
            c.world.width = 2;
            c.world.height = 1;
            c.hardware.cycles_per_update = 100;
            c.hardware.random_io_input = false;
            c.tasks.limited_task_reset_interval = 1;
            c.reproduction.sym_horiz_trans_res = 4.0;
        })
        .with_host(0, Program::blank(PROGRAM_LENGTH))
        .with_host(1, Program::blank(PROGRAM_LENGTH))
        .with_symbiont(0, not_program(PROGRAM_LENGTH))
        .build_placed();

    world.run(30);

    let free_symbionts = world.organism(placed.hosts[1]).unwrap().symbionts.len();
    assert_eq!(free_symbionts, 1);
    assert_population!(world, 2, 2);

    let checkpoint = world.checkpoint();
    assert_eq!(checkpoint.total("horizontal_successes"), 1.0);
    assert!(checkpoint.total("horizontal_attempts") >= 1.0);
    assert!(checkpoint.total("symbiont_earned") > 0.0);
}

#[test]
fn test_parent_tasks_are_inherited() {
    let (mut world, placed) = breeding_world()
        .with_config(|c| c.reproduction.track_parent_tasks = true)
        .with_host(0, not_program(PROGRAM_LENGTH))
        .build_placed();
    let parent = placed.hosts[0];

    world.update();

    let child = world
        .population()
        .occupied()
        .map(|(_, e)| e)
        .find(|&e| e != parent)
        .unwrap();
    let child = world.organism(child).unwrap();
    let not = world.tasks().id_of("NOT").unwrap();
    assert!(child.cpu.state.parent_tasks_performed.get(not));
    assert!(child.cpu.state.tasks_performed.is_empty());
    assert_eq!(child.cpu.state.lineage.gained[not], 1);
}

#[test]
fn test_symbiont_lifespan_leaves_host_alive() {
    let (mut world, placed) = breeding_world()
        .with_config(|c| {
            c.reproduction.host_repro_res = 1_000_000.0;
            c.reproduction.sym_lifespan = Some(2);
        })
        .with_host(0, ProgramBuilder::new().build_without_repro(PROGRAM_LENGTH))
        .with_symbiont(0, Program::blank(PROGRAM_LENGTH))
        .build_placed();

    world.run(2);
    assert_population!(world, 1, 1);
    world.update();
    assert_population!(world, 1, 0);
    assert_gone!(world, placed.symbionts[0]);
    assert!(world.population().is_alive(placed.hosts[0]));
}

#[test]
fn test_host_old_age_takes_its_symbionts() {
    let (mut world, placed) = breeding_world()
        .with_config(|c| {
            c.reproduction.host_repro_res = 1_000_000.0;
            c.reproduction.host_lifespan = Some(1);
        })
        .with_host(0, ProgramBuilder::new().build_without_repro(PROGRAM_LENGTH))
        .with_symbiont(0, Program::blank(PROGRAM_LENGTH))
        .build_placed();
    let (host, symbiont) = (placed.hosts[0], placed.symbionts[0]);

    world.update();
    assert_population!(world, 1, 1);

    world.run(2);
    assert_gone!(world, host);
    assert_gone!(world, symbiont);
    assert_population!(world, 0, 0);
    assert_eq!(world.checkpoint().total("deaths"), 2.0);
}

#[test]
fn test_symbiont_births_die_with_an_expiring_host() {
    for seed in 0..8 {
        let (mut world, placed) = WorldBuilder::new()
            .with_seed(seed)
            .with_config(|c| {
                c.world.width = 2;
                c.world.height = 1;
                c.hardware.cycles_per_update = 100;
                c.hardware.random_io_input = false;
                c.tasks.limited_task_reset_interval = 1;
                c.reproduction.host_lifespan = Some(0);
                c.reproduction.sym_horiz_trans_res = 4.0;
            })
            .with_host(0, ProgramBuilder::new().build_without_repro(PROGRAM_LENGTH))
            .with_symbiont(0, not_program(PROGRAM_LENGTH))
            .build_placed();

        world.update();

        assert_gone!(world, placed.symbionts[0]);
        assert_population!(world, 0, 0);
        assert!(world.repro_queue().is_empty());
        let checkpoint = world.checkpoint();
        assert_eq!(checkpoint.total("horizontal_attempts"), 0.0, "seed {seed}");
        assert_eq!(checkpoint.total("births"), 0.0, "seed {seed}");
        assert_eq!(checkpoint.total("deaths"), 2.0, "seed {seed}");
    }
}
