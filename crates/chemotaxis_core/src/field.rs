//! Chemical concentration fields.
//!
//! Concentration is a static superposition of every active source. Lookups
//! either sum the sources directly ([`DirectField`]) or bilinearly
//! interpolate a [`ConcentrationGrid`] that [`ChemicalField`] rebuilds
//! lazily whenever the sources drift away from the values it was built from.

use crate::config::{FieldConfig, FieldMode};
use crate::source::SourceLogic;
use chemotaxis_data::{ChemicalSource, Point, Rect};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Finite-difference sampling distance used by [`ConcentrationField::gradient_at`].
pub const GRADIENT_STEP: f64 = 0.5;
/// Gradients weaker than this are reported as the zero vector.
pub const MIN_GRADIENT_MAGNITUDE: f64 = 1e-9;

/// Read access to a scalar concentration field.
pub trait ConcentrationField {
    fn concentration_at(&self, p: Point) -> f64;

    /// Whether `p` lies inside the domain where the field is defined.
    fn covers(&self, _p: Point) -> bool {
        true
    }

    /// Unit vector pointing up the concentration slope, zero without signal.
    fn gradient_at(&self, p: Point) -> Point {
        let gx = axis_derivative(self, p, Point::new(GRADIENT_STEP, 0.0));
        let gy = axis_derivative(self, p, Point::new(0.0, GRADIENT_STEP));
        let magnitude = (gx * gx + gy * gy).sqrt();
        if !magnitude.is_finite() || magnitude < MIN_GRADIENT_MAGNITUDE {
            return Point::ZERO;
        }
        Point::new(gx / magnitude, gy / magnitude)
    }
}

/// Central difference along `step`, one-sided where a sample leaves the domain.
fn axis_derivative<F: ConcentrationField + ?Sized>(field: &F, p: Point, step: Point) -> f64 {
    let delta = step.length();
    let forward = Point::new(p.x + step.x, p.y + step.y);
    let backward = Point::new(p.x - step.x, p.y - step.y);
    match (field.covers(backward), field.covers(forward)) {
        (true, true) => {
            (field.concentration_at(forward) - field.concentration_at(backward)) / (2.0 * delta)
        }
        (false, true) => (field.concentration_at(forward) - field.concentration_at(p)) / delta,
        (true, false) => (field.concentration_at(p) - field.concentration_at(backward)) / delta,
        (false, false) => 0.0,
    }
}

/// Exact superposition over a borrowed source list.
#[derive(Debug, Clone, Copy)]
pub struct DirectField<'a> {
    pub sources: &'a [ChemicalSource],
}

impl<'a> DirectField<'a> {
    #[must_use]
    pub fn new(sources: &'a [ChemicalSource]) -> Self {
        Self { sources }
    }
}

impl ConcentrationField for DirectField<'_> {
    fn concentration_at(&self, p: Point) -> f64 {
        self.sources
            .iter()
            .filter(|s| s.active)
            .map(|s| s.concentration_at(p))
            .sum()
    }
}

/// Uniform grid of concentration samples.
///
/// Node `(i, j)` sits at `origin + (i * cell_size, j * cell_size)`; values
/// are stored row-major. Lookups outside the node extent return 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcentrationGrid {
    pub origin: Point,
    pub cell_size: f64,
    pub cols: usize,
    pub rows: usize,
    pub values: Vec<f64>,
}

impl ConcentrationGrid {
    /// Wraps precomputed node values.
    pub fn from_values(
        origin: Point,
        cell_size: f64,
        cols: usize,
        rows: usize,
        values: Vec<f64>,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(cell_size > 0.0, "Grid cell size must be positive");
        anyhow::ensure!(cols >= 2 && rows >= 2, "Grid needs at least 2x2 nodes");
        anyhow::ensure!(
            values.len() == cols * rows,
            "Grid expects {} values, got {}",
            cols * rows,
            values.len()
        );
        Ok(Self {
            origin,
            cell_size,
            cols,
            rows,
            values,
        })
    }

    /// Samples `field` on a grid spanning `bounds`.
    pub fn sample<F: ConcentrationField + Sync>(field: &F, bounds: Rect, cell_size: f64) -> Self {
        let cell_size = if cell_size > 0.0 { cell_size } else { 1.0 };
        let cols = ((bounds.width / cell_size).ceil() as usize).max(1) + 1;
        let rows = ((bounds.height / cell_size).ceil() as usize).max(1) + 1;
        let mut values = vec![0.0; cols * rows];

        let fill_row = |(j, row): (usize, &mut [f64])| {
            let y = j as f64 * cell_size;
            for (i, v) in row.iter_mut().enumerate() {
                *v = field.concentration_at(Point::new(i as f64 * cell_size, y));
            }
        };
        #[cfg(feature = "parallel")]
        values.par_chunks_mut(cols).enumerate().for_each(fill_row);
        #[cfg(not(feature = "parallel"))]
        values.chunks_mut(cols).enumerate().for_each(fill_row);

        Self {
            origin: Point::ZERO,
            cell_size,
            cols,
            rows,
            values,
        }
    }

    /// Far corner of the node extent.
    #[must_use]
    pub fn extent(&self) -> Point {
        Point::new(
            self.origin.x + (self.cols - 1) as f64 * self.cell_size,
            self.origin.y + (self.rows - 1) as f64 * self.cell_size,
        )
    }

    #[inline(always)]
    fn value(&self, i: usize, j: usize) -> f64 {
        self.values[j * self.cols + i]
    }

    /// Cell index and in-cell fraction along one axis.
    #[inline(always)]
    fn locate(offset: f64, cell_size: f64, nodes: usize) -> (usize, f64) {
        let f = offset / cell_size;
        let i = (f.floor() as usize).min(nodes - 2);
        (i, (f - i as f64).clamp(0.0, 1.0))
    }
}

impl ConcentrationField for ConcentrationGrid {
    fn concentration_at(&self, p: Point) -> f64 {
        if !self.covers(p) {
            return 0.0;
        }
        let (i, tx) = Self::locate(p.x - self.origin.x, self.cell_size, self.cols);
        let (j, ty) = Self::locate(p.y - self.origin.y, self.cell_size, self.rows);

        let top = self.value(i, j) * (1.0 - tx) + self.value(i + 1, j) * tx;
        let bottom = self.value(i, j + 1) * (1.0 - tx) + self.value(i + 1, j + 1) * tx;
        (top * (1.0 - ty) + bottom * ty).max(0.0)
    }

    fn covers(&self, p: Point) -> bool {
        let far = self.extent();
        p.x >= self.origin.x && p.x <= far.x && p.y >= self.origin.y && p.y <= far.y
    }
}

/// Source state a grid was built from.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SourceBasis {
    energy: f64,
    max_energy: f64,
    active: bool,
}

impl From<&ChemicalSource> for SourceBasis {
    fn from(s: &ChemicalSource) -> Self {
        Self {
            energy: s.energy,
            max_energy: s.max_energy,
            active: s.active,
        }
    }
}

#[derive(Debug, Default)]
enum CacheState {
    #[default]
    Empty,
    Ready {
        grid: Arc<ConcentrationGrid>,
        basis: Vec<SourceBasis>,
    },
}

#[derive(Debug)]
struct FieldState {
    mode: FieldMode,
    bounds: Rect,
    cell_size: f64,
    threshold: f64,
    cache: CacheState,
    rebuilds: u64,
}

/// Field lookups over the world's sources, with an optional cached grid.
///
/// The cache is either `Empty` or `Ready`. A miss builds and publishes the
/// grid inside the same critical section, so no reader sees a partial build.
#[derive(Debug)]
pub struct ChemicalField {
    state: Mutex<FieldState>,
}

/// A borrowed, ready-to-query field.
#[derive(Debug, Clone)]
pub enum FieldView<'a> {
    Direct(DirectField<'a>),
    Grid(Arc<ConcentrationGrid>),
}

impl ConcentrationField for FieldView<'_> {
    fn concentration_at(&self, p: Point) -> f64 {
        match self {
            FieldView::Direct(f) => f.concentration_at(p),
            FieldView::Grid(g) => g.concentration_at(p),
        }
    }

    fn covers(&self, p: Point) -> bool {
        match self {
            FieldView::Direct(f) => f.covers(p),
            FieldView::Grid(g) => g.covers(p),
        }
    }
}

impl ChemicalField {
    #[must_use]
    pub fn new(bounds: Rect, config: &FieldConfig) -> Self {
        Self {
            state: Mutex::new(FieldState {
                mode: config.mode,
                bounds,
                cell_size: config.grid_cell_size,
                threshold: config.invalidation_threshold,
                cache: CacheState::Empty,
                rebuilds: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FieldState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies new geometry/settings and drops any cached grid.
    pub fn reconfigure(&self, bounds: Rect, config: &FieldConfig) {
        let mut state = self.lock();
        state.mode = config.mode;
        state.bounds = bounds;
        state.cell_size = config.grid_cell_size;
        state.threshold = config.invalidation_threshold;
        state.cache = CacheState::Empty;
    }

    #[must_use]
    pub fn mode(&self) -> FieldMode {
        self.lock().mode
    }

    /// Number of grid builds so far.
    #[must_use]
    pub fn rebuild_count(&self) -> u64 {
        self.lock().rebuilds
    }

    #[must_use]
    pub fn is_cached(&self) -> bool {
        matches!(self.lock().cache, CacheState::Ready { .. })
    }

    pub fn invalidate(&self) {
        self.lock().cache = CacheState::Empty;
    }

    /// Drops the cached grid if `sources` moved past the invalidation
    /// threshold. Returns whether the cache was invalidated.
    pub fn sync(&self, sources: &[ChemicalSource]) -> bool {
        let mut state = self.lock();
        let stale = match &state.cache {
            CacheState::Ready { basis, .. } => is_stale(basis, sources, state.threshold),
            _ => false,
        };
        if stale {
            tracing::trace!(sources = sources.len(), "Field cache invalidated");
            state.cache = CacheState::Empty;
        }
        stale
    }

    /// Drops a stale grid and, in grid mode, rebuilds it straight away.
    /// Returns whether a build happened.
    pub fn refresh(&self, sources: &[ChemicalSource]) -> bool {
        self.sync(sources);
        if self.mode() == FieldMode::Grid && !self.is_cached() {
            let _ = self.grid(sources);
            return true;
        }
        false
    }

    /// Returns the cached grid, building it first when absent.
    pub fn grid(&self, sources: &[ChemicalSource]) -> Arc<ConcentrationGrid> {
        let mut state = self.lock();
        if let CacheState::Ready { grid, .. } = &state.cache {
            return Arc::clone(grid);
        }
        let grid = Arc::new(ConcentrationGrid::sample(
            &DirectField::new(sources),
            state.bounds,
            state.cell_size,
        ));
        state.cache = CacheState::Ready {
            grid: Arc::clone(&grid),
            basis: sources.iter().map(SourceBasis::from).collect(),
        };
        state.rebuilds += 1;
        tracing::debug!(
            cols = grid.cols,
            rows = grid.rows,
            rebuilds = state.rebuilds,
            "Field grid rebuilt"
        );
        grid
    }

    /// A queryable view honouring the configured mode.
    pub fn view<'a>(&self, sources: &'a [ChemicalSource]) -> FieldView<'a> {
        match self.mode() {
            FieldMode::Direct => FieldView::Direct(DirectField::new(sources)),
            FieldMode::Grid => FieldView::Grid(self.grid(sources)),
        }
    }

    pub fn concentration_at(&self, sources: &[ChemicalSource], p: Point) -> f64 {
        self.view(sources).concentration_at(p)
    }
}

fn is_stale(basis: &[SourceBasis], sources: &[ChemicalSource], threshold: f64) -> bool {
    if basis.len() != sources.len() {
        return true;
    }
    basis.iter().zip(sources).any(|(b, s)| {
        if b.active != s.active || b.max_energy != s.max_energy {
            return true;
        }
        let scale = s.max_energy.max(f64::EPSILON);
        (s.energy - b.energy).abs() / scale > threshold
    })
}
