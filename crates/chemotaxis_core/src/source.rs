//! Per-source emission and energy bookkeeping.

use chemotaxis_data::{ChemicalSource, Point};

pub trait SourceLogic {
    /// Fraction of the energy budget left, in `[0, 1]`.
    fn energy_ratio(&self) -> f64;
    /// Contribution of this source to the concentration at `p`.
    fn concentration_at(&self, p: Point) -> f64;
    /// Passive depletion over `dt` seconds. Returns the energy removed.
    fn update(&mut self, dt: f64) -> f64;
    /// Removes up to `amount` energy. Returns the energy actually removed.
    fn deplete(&mut self, amount: f64) -> f64;
    /// Restores the source to full energy.
    fn recharge(&mut self) -> f64;
    /// Adds up to `amount` energy without passing capacity. Returns the
    /// energy actually added.
    fn top_up(&mut self, amount: f64) -> f64;
}

impl SourceLogic for ChemicalSource {
    fn energy_ratio(&self) -> f64 {
        if self.max_energy > 0.0 {
            (self.energy / self.max_energy).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    fn concentration_at(&self, p: Point) -> f64 {
        if !self.active || self.strength <= 0.0 {
            return 0.0;
        }
        let ratio = self.energy_ratio();
        let dist_sq = self.position.distance_squared(p);
        if dist_sq == 0.0 {
            return self.strength * ratio;
        }
        self.strength / (1.0 + dist_sq * self.decay_factor) * ratio
    }

    fn update(&mut self, dt: f64) -> f64 {
        if !self.active || dt <= 0.0 {
            return 0.0;
        }
        self.deplete(self.depletion_rate * dt)
    }

    fn deplete(&mut self, amount: f64) -> f64 {
        if !self.active || amount <= 0.0 || amount.is_nan() {
            return 0.0;
        }
        let removed = amount.min(self.energy);
        self.energy -= removed;
        if self.energy <= 0.0 {
            self.energy = 0.0;
            self.active = false;
        }
        removed
    }

    fn recharge(&mut self) -> f64 {
        let added = self.max_energy - self.energy;
        self.energy = self.max_energy;
        self.active = self.energy > 0.0;
        added
    }

    fn top_up(&mut self, amount: f64) -> f64 {
        if amount.is_nan() || amount <= 0.0 {
            return 0.0;
        }
        let added = amount.min((self.max_energy - self.energy).max(0.0));
        self.energy += added;
        self.active = self.energy > 0.0;
        added
    }
}
