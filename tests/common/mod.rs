pub mod macros;

use chemotaxis_core::config::{AppConfig, FieldMode};
use chemotaxis_core::world::{WorldCoordinator, WorldHandle};
use chemotaxis_data::{ChemicalSource, MetabolicTraits, Organism, Point, SensorAngles};

type WorldMod = Box<dyn FnOnce(&WorldCoordinator)>;

/// Builds a world that starts empty unless populated explicitly.
#[allow(dead_code)]
pub struct WorldBuilder {
    config: AppConfig,
    organisms: Vec<Organism>,
    sources: Vec<ChemicalSource>,
    mods: Vec<WorldMod>,
}

#[allow(dead_code)]
impl WorldBuilder {
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.world.width = 100.0;
        config.world.height = 100.0;
        config.organism.count = 0;
        config.chemical.count = 0;
        config.chemical.regeneration_probability = 0.0;
        Self {
            config,
            organisms: Vec::new(),
            sources: Vec::new(),
            mods: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.world.seed = Some(seed);
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.config.world.width = width;
        self.config.world.height = height;
        self
    }

    pub fn with_field_mode(mut self, mode: FieldMode) -> Self {
        self.config.field.mode = mode;
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn with_organism(mut self, organism: Organism) -> Self {
        self.organisms.push(organism);
        self
    }

    pub fn with_source(mut self, source: ChemicalSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_world_mod<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&WorldCoordinator) + 'static,
    {
        self.mods.push(Box::new(modifier));
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn build(self) -> WorldHandle {
        let world =
            WorldCoordinator::new(self.config).expect("Failed to create world in test builder");
        for source in self.sources {
            assert!(world.add_chemical_source(source), "builder source out of bounds");
        }
        for organism in self.organisms {
            assert!(world.add_organism(organism), "builder organism out of bounds");
        }
        for modifier in self.mods {
            modifier(&world);
        }
        world.into_handle()
    }
}

#[allow(dead_code)]
pub struct OrganismBuilder {
    id: u64,
    position: Point,
    heading: f64,
    preference: f64,
    speed: f64,
    energy: f64,
    capacity: f64,
    generation: u32,
    metabolism: MetabolicTraits,
    time_since_reproduction: f64,
}

#[allow(dead_code)]
impl OrganismBuilder {
    pub fn new() -> Self {
        Self {
            id: 0,
            position: Point::new(50.0, 50.0),
            heading: 0.0,
            preference: 40.0,
            speed: 10.0,
            energy: 60.0,
            capacity: 100.0,
            generation: 1,
            metabolism: MetabolicTraits {
                metabolic_rate: 0.5,
                movement_cost: 0.01,
                sensing_cost: 0.02,
                optimal_gain: 2.0,
                energy_efficiency: 1.0,
            },
            time_since_reproduction: 0.0,
        }
    }

    pub fn id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Point::new(x, y);
        self
    }

    pub fn heading(mut self, heading: f64) -> Self {
        self.heading = heading;
        self
    }

    pub fn preference(mut self, preference: f64) -> Self {
        self.preference = preference;
        self
    }

    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn energy(mut self, energy: f64, capacity: f64) -> Self {
        self.energy = energy;
        self.capacity = capacity;
        self
    }

    pub fn generation(mut self, generation: u32) -> Self {
        self.generation = generation;
        self
    }

    pub fn idle(mut self) -> Self {
        self.metabolism.metabolic_rate = 0.0;
        self.metabolism.movement_cost = 0.0;
        self.metabolism.sensing_cost = 0.0;
        self.metabolism.optimal_gain = 0.0;
        self
    }

    pub fn ready_to_reproduce(mut self) -> Self {
        self.time_since_reproduction = 1_000.0;
        self
    }

    pub fn build(self) -> Organism {
        Organism {
            id: self.id,
            parent_id: None,
            generation: self.generation,
            position: self.position,
            heading: self.heading,
            previous_heading: self.heading,
            chem_preference: self.preference,
            speed: self.speed,
            sensor_angles: SensorAngles::default(),
            energy: self.energy,
            energy_capacity: self.capacity,
            metabolism: self.metabolism,
            time_since_reproduction: self.time_since_reproduction,
            mark_for_removal: false,
        }
    }
}

/// A fully charged source with no passive depletion.
#[allow(dead_code)]
pub fn source(x: f64, y: f64, strength: f64, decay: f64, energy: f64) -> ChemicalSource {
    ChemicalSource::new(Point::new(x, y), strength, decay, energy, 0.0)
}

/// Seeded default configuration.
#[allow(dead_code)]
pub fn seeded_config(seed: u64) -> AppConfig {
    let mut config = AppConfig::default();
    config.world.seed = Some(seed);
    config
}
