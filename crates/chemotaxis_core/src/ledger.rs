//! System-wide source energy accounting.
//!
//! The ledger keeps a running total of the energy held by all chemical
//! sources and applies the policies that move it: passive depletion,
//! consumption by feeding organisms, and deficit-driven regeneration.
//!
//! A regeneration event prefers, in order: reactivating a spent source,
//! creating a source while the world holds fewer than the configured count,
//! and topping up the most depleted sources until the deficit is covered.
//! The last two only fire while the deficit is at least
//! [`MIN_DEFICIT_FRACTION`] of target.

use crate::config::ChemicalConfig;
use crate::source::SourceLogic;
use chemotaxis_data::{ChemicalSource, Point, Rect};
use rand::Rng;

/// Creation and top-ups are skipped when the deficit is below this
/// fraction of target.
pub const MIN_DEFICIT_FRACTION: f64 = 0.01;

/// Something organisms can draw energy from at a position.
pub trait EnergySink {
    /// Removes energy on behalf of a consumer that gained `amount` at
    /// `position`. Returns the energy actually removed from sources.
    fn deplete(&mut self, position: Point, amount: f64) -> f64;
}

/// What regeneration did during one update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Regeneration {
    Reactivated { index: usize, energy: f64 },
    Created { index: usize, energy: f64 },
    /// Active sources were refilled toward capacity.
    Recharged { sources: usize, energy: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LedgerUpdate {
    pub passive_loss: f64,
    pub deactivated: usize,
    pub regeneration: Option<Regeneration>,
}

#[derive(Debug, Clone)]
pub struct EnergyLedger {
    total_system_energy: f64,
    target_system_energy: f64,
    policy: ChemicalConfig,
    bounds: Rect,
}

impl EnergyLedger {
    /// A ledger whose running total starts at the energy held by `sources`.
    #[must_use]
    pub fn new(policy: &ChemicalConfig, bounds: Rect, sources: &[ChemicalSource]) -> Self {
        Self {
            total_system_energy: sources.iter().map(|s| s.energy).sum(),
            target_system_energy: policy.target_system_energy,
            policy: policy.clone(),
            bounds,
        }
    }

    /// `(total, target)`.
    #[must_use]
    pub fn system_energy_info(&self) -> (f64, f64) {
        (self.total_system_energy, self.target_system_energy)
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.total_system_energy
    }

    #[must_use]
    pub fn target(&self) -> f64 {
        self.target_system_energy
    }

    #[must_use]
    pub fn deficit(&self) -> f64 {
        self.target_system_energy - self.total_system_energy
    }

    #[must_use]
    pub fn consumption_multiplier(&self) -> f64 {
        self.policy.consumption_multiplier
    }

    /// Resynchronises the running total with the sources and returns the
    /// drift that was corrected.
    pub fn recompute_total(&mut self, sources: &[ChemicalSource]) -> f64 {
        let actual: f64 = sources.iter().map(|s| s.energy).sum();
        let drift = actual - self.total_system_energy;
        self.total_system_energy = actual;
        drift
    }

    fn debit(&mut self, amount: f64) {
        self.total_system_energy = (self.total_system_energy - amount).max(0.0);
    }

    /// Adds `source` to the world and credits its energy.
    pub fn register_source(&mut self, sources: &mut Vec<ChemicalSource>, source: ChemicalSource) {
        self.total_system_energy += source.energy;
        sources.push(source);
    }

    /// Removes consumption energy from the sources around `position`.
    ///
    /// `amount` is scaled by the consumption multiplier and split across
    /// active sources in proportion to their contribution at `position`.
    pub fn deplete(
        &mut self,
        sources: &mut [ChemicalSource],
        position: Point,
        amount: f64,
    ) -> f64 {
        let requested = amount * self.policy.consumption_multiplier;
        if requested.is_nan() || requested <= 0.0 || !position.is_finite() {
            return 0.0;
        }

        let contributions: Vec<(usize, f64)> = sources
            .iter()
            .enumerate()
            .filter(|(_, s)| s.active)
            .map(|(i, s)| (i, s.concentration_at(position)))
            .filter(|(_, c)| *c > 0.0)
            .collect();
        let total: f64 = contributions.iter().map(|(_, c)| c).sum();
        if total <= 0.0 || !total.is_finite() {
            return 0.0;
        }

        let mut removed = 0.0;
        for (i, contribution) in contributions {
            removed += sources[i].deplete(requested * contribution / total);
        }
        self.debit(removed);
        removed
    }

    /// Passive depletion followed by a regeneration roll.
    pub fn update_sources<R: Rng + ?Sized>(
        &mut self,
        sources: &mut Vec<ChemicalSource>,
        dt: f64,
        rng: &mut R,
    ) -> LedgerUpdate {
        let mut update = LedgerUpdate::default();
        if dt.is_nan() || dt <= 0.0 {
            return update;
        }

        for source in sources.iter_mut() {
            let was_active = source.active;
            update.passive_loss += source.update(dt);
            if was_active && !source.active {
                update.deactivated += 1;
            }
        }
        self.debit(update.passive_loss);

        let chance = (self.policy.regeneration_probability * dt).clamp(0.0, 1.0);
        if chance > 0.0 && rng.gen_bool(chance) {
            update.regeneration = self.regenerate(sources, rng);
        }
        update
    }

    fn regenerate<R: Rng + ?Sized>(
        &mut self,
        sources: &mut Vec<ChemicalSource>,
        rng: &mut R,
    ) -> Option<Regeneration> {
        let inactive: Vec<usize> = sources
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.active)
            .map(|(i, _)| i)
            .collect();

        if !inactive.is_empty() {
            let index = inactive[rng.gen_range(0..inactive.len())];
            let energy = sources[index].recharge();
            self.total_system_energy += energy;
            return Some(Regeneration::Reactivated { index, energy });
        }

        if sources.len() < self.policy.count {
            return self.create_source(sources, rng).map(|index| Regeneration::Created {
                index,
                energy: sources[index].energy,
            });
        }
        self.top_up_sources(sources)
            .map(|(count, energy)| Regeneration::Recharged { sources: count, energy })
    }

    /// Refills sources, most depleted first, until the deficit is covered
    /// or every source is full. Returns how many sources were topped up and
    /// the energy added, or `None` when the deficit is below
    /// [`MIN_DEFICIT_FRACTION`] of target or no source had room.
    pub fn top_up_sources(&mut self, sources: &mut [ChemicalSource]) -> Option<(usize, f64)> {
        let mut deficit = self.deficit();
        if self.target_system_energy <= 0.0
            || deficit < self.target_system_energy * MIN_DEFICIT_FRACTION
        {
            return None;
        }
        let mut order: Vec<usize> = (0..sources.len())
            .filter(|&i| sources[i].energy < sources[i].max_energy)
            .collect();
        order.sort_by(|&a, &b| sources[a].energy_ratio().total_cmp(&sources[b].energy_ratio()));

        let mut topped = 0;
        let mut added = 0.0;
        for i in order {
            if deficit <= 0.0 {
                break;
            }
            let energy = sources[i].top_up(deficit);
            if energy > 0.0 {
                topped += 1;
                added += energy;
                deficit -= energy;
            }
        }
        if topped == 0 {
            return None;
        }
        self.total_system_energy += added;
        Some((topped, added))
    }

    /// Creates a source sized against the current deficit.
    ///
    /// Returns the index of the new source, or `None` when the deficit is
    /// below [`MIN_DEFICIT_FRACTION`] of target.
    pub fn create_source<R: Rng + ?Sized>(
        &mut self,
        sources: &mut Vec<ChemicalSource>,
        rng: &mut R,
    ) -> Option<usize> {
        let deficit = self.deficit();
        if self.target_system_energy <= 0.0
            || deficit < self.target_system_energy * MIN_DEFICIT_FRACTION
        {
            return None;
        }
        let pressure = (deficit / self.target_system_energy).clamp(0.0, 1.0);
        let p = &self.policy;

        let strength = sample_range(rng, p.strength_min, p.strength_max) * (1.0 + pressure);
        let decay = sample_range(rng, p.decay_min, p.decay_max);
        let budget = (p.source_max_energy * (1.0 + pressure)).min(deficit);
        let position = Point::new(
            sample_range(rng, 0.0, self.bounds.width),
            sample_range(rng, 0.0, self.bounds.height),
        );

        let source = ChemicalSource::new(position, strength, decay, budget, p.depletion_rate);
        tracing::debug!(
            x = position.x,
            y = position.y,
            strength,
            energy = budget,
            deficit,
            "Chemical source created"
        );
        self.register_source(sources, source);
        Some(sources.len() - 1)
    }
}

/// Uniform sample in `[lo, hi)`, or `lo` for an empty range.
pub(crate) fn sample_range<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}
