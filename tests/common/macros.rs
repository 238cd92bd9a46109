/// Asserts that an organism's balance equals the expected value within 1e-9.
#[macro_export]
macro_rules! assert_points {
    ($world:expr, $entity:expr, $expected:expr) => {{
        let organism = $world.organism($entity).expect("Organism not found in world");
        assert!(
            (organism.points - $expected).abs() < 1e-9,
            "Organism {:?} has {} points, expected {}",
            $entity,
            organism.points,
            $expected
        );
    }};
}

/// Asserts that an organism has been credited with exactly the named tasks.
#[macro_export]
macro_rules! assert_tasks_exactly {
    ($world:expr, $entity:expr, [$($name:expr),* $(,)?]) => {{
        let organism = $world.organism($entity).expect("Organism not found in world");
        let performed: Vec<&str> = organism
            .cpu
            .state
            .tasks_performed
            .iter()
            .filter_map(|id| $world.tasks().get(id).map(|t| t.name.as_str()))
            .collect();
        let expected: Vec<&str> = vec![$($name),*];
        assert_eq!(performed, expected, "Task set mismatch for {:?}", $entity);
    }};
}

/// Asserts that an organism is no longer in the world.
#[macro_export]
macro_rules! assert_gone {
    ($world:expr, $entity:expr) => {{
        assert!(
            !$world.population().contains($entity),
            "Organism {:?} should be gone but was found",
            $entity
        );
    }};
}

/// Asserts host and symbiont head counts.
#[macro_export]
macro_rules! assert_population {
    ($world:expr, $hosts:expr, $symbionts:expr) => {{
        assert_eq!($world.population().num_hosts(), $hosts, "Host count mismatch");
        assert_eq!(
            $world.population().num_symbionts(),
            $symbionts,
            "Symbiont count mismatch"
        );
    }};
}
