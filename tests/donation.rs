mod common;

use common::WorldBuilder;
use symbiolab_core::cpu::builder::ProgramBuilder;
use symbiolab_core::organism::TRANSFER_FRACTION;
use symbiolab_data::{OpCode, Program, PROGRAM_LENGTH};

const PENALTY: f64 = 0.1;

fn transfer_world(op: OpCode, count: usize, enabled: bool) -> WorldBuilder {
    WorldBuilder::new()
        .with_config(|c| {
            c.hardware.cycles_per_update = 100;
            c.symbiosis.donation_steal_inst = enabled;
            c.symbiosis.donate_penalty = PENALTY;
            c.symbiosis.steal_penalty = PENALTY;
        })
        .with_host(0, Program::blank(PROGRAM_LENGTH))
        .with_symbiont(
            0,
            ProgramBuilder::new()
                .add_spread(op, count)
                .build_without_repro(PROGRAM_LENGTH),
        )
}

/// Applies `count` transfers from `giver` to `taker` and returns the final
/// balances and the total moved.
fn expected_transfers(mut giver: f64, mut taker: f64, count: usize) -> (f64, f64, f64) {
    let mut moved = 0.0;
    for _ in 0..count {
        let amount = giver.min((giver + taker) * TRANSFER_FRACTION);
        giver -= amount;
        taker += amount * (1.0 - PENALTY);
        moved += amount;
    }
    (giver, taker, moved)
}

#[test]
fn test_mutualist_donates_to_host() {
    let (mut world, placed) = transfer_world(OpCode::Donate, 5, true).build_placed();
    let (host, symbiont) = (placed.hosts[0], placed.symbionts[0]);
    world.with_organism_mut(symbiont, |s| s.points = 100.0);

    world.update();

    let (sym_left, host_got, moved) = expected_transfers(100.0, 0.0, 5);
    assert_points!(world, symbiont, sym_left);
    assert_points!(world, host, host_got);

    let checkpoint = world.checkpoint();
    assert_eq!(checkpoint.total("donations"), 5.0);
    assert!((checkpoint.total("donated") - moved).abs() < 1e-9);
    assert_eq!(checkpoint.total("steals"), 0.0);
}

#[test]
fn test_parasite_steals_from_host() {
    let (mut world, placed) = transfer_world(OpCode::Steal, 3, true).build_placed();
    let (host, symbiont) = (placed.hosts[0], placed.symbionts[0]);
    world.with_organism_mut(host, |h| h.points = 50.0);

    world.update();

    let (host_left, sym_got, moved) = expected_transfers(50.0, 0.0, 3);
    assert_points!(world, host, host_left);
    assert_points!(world, symbiont, sym_got);

    let checkpoint = world.checkpoint();
    assert_eq!(checkpoint.total("steals"), 3.0);
    assert!((checkpoint.total("stolen") - moved).abs() < 1e-9);
}

#[test]
fn test_transfers_disabled() {
    let (mut world, placed) = transfer_world(OpCode::Steal, 3, false).build_placed();
    let (host, symbiont) = (placed.hosts[0], placed.symbionts[0]);
    world.with_organism_mut(host, |h| h.points = 50.0);

    world.update();

    assert_points!(world, host, 50.0);
    assert_points!(world, symbiont, 0.0);
    assert_eq!(world.checkpoint().total("steals"), 0.0);
}

#[test]
fn test_donation_from_empty_symbiont_moves_nothing() {
    let (mut world, placed) = transfer_world(OpCode::Donate, 5, true).build_placed();
    world.with_organism_mut(placed.hosts[0], |h| h.points = 10.0);

    world.update();

    assert_points!(world, placed.hosts[0], 10.0);
    assert_eq!(world.checkpoint().total("donations"), 0.0);
}
