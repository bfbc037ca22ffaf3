/// Asserts two floats differ by at most the given tolerance.
#[macro_export]
macro_rules! assert_approx {
    ($left:expr, $right:expr, $tol:expr) => {{
        let (l, r, t): (f64, f64, f64) = ($left, $right, $tol);
        assert!(
            (l - r).abs() <= t,
            "{} = {} is not within {} of {} = {}",
            stringify!($left),
            l,
            t,
            stringify!($right),
            r
        );
    }};
}

/// Asserts every organism and source in the world has energy inside its
/// allowed range.
#[macro_export]
macro_rules! assert_energy_bounded {
    ($world:expr) => {
        for o in $world.organisms() {
            assert!(
                o.energy >= 0.0 && o.energy <= o.energy_capacity + 1e-9,
                "Organism {} energy {} outside [0, {}]",
                o.id,
                o.energy,
                o.energy_capacity
            );
        }
        for (i, s) in $world.chemical_sources().iter().enumerate() {
            assert!(
                s.energy >= 0.0 && s.energy <= s.max_energy + 1e-9,
                "Source {} energy {} outside [0, {}]",
                i,
                s.energy,
                s.max_energy
            );
        }
    };
}

/// Asserts the organism count matches.
#[macro_export]
macro_rules! assert_population {
    ($world:expr, $count:expr) => {
        assert_eq!($world.organism_count(), $count, "Population count mismatch");
    };
}
