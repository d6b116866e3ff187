use crate::noise::Noise;
use glam::Vec2;
use std::f32::consts::TAU;

#[derive(Clone, Copy, Debug)]
pub(crate) struct FieldParams {
    pub(crate) strength: f32,   // magnitude of every cell vector
    pub(crate) complexity: f64, // noise step between neighbouring cells
    pub(crate) time_step: f64,  // noise time advance per regeneration
}

/// Grid of steering vectors sampled from 3D noise (x, y, time).
///
/// Dimensions are fixed at construction and travel with the field, so
/// anything looking up a cell uses the same geometry the field was built
/// with.
pub(crate) struct FlowField {
    cols: usize,
    rows: usize,
    cell_size: f32,
    params: FieldParams,
    vectors: Vec<Vec2>,
}

impl FlowField {
    pub(crate) fn new(width: f32, height: f32, cell_size: u32, params: FieldParams) -> Self {
        let cell_size = cell_size.max(1) as f32;
        let cols = (width / cell_size).floor().max(0.0) as usize;
        let rows = (height / cell_size).floor().max(0.0) as usize;
        Self {
            cols,
            rows,
            cell_size,
            params,
            vectors: vec![Vec2::ZERO; cols * rows],
        }
    }

    pub(crate) fn cols(&self) -> usize {
        self.cols
    }

    pub(crate) fn rows(&self) -> usize {
        self.rows
    }

    #[cfg(test)]
    pub(crate) fn vectors(&self) -> &[Vec2] {
        &self.vectors
    }

    fn idx(&self, col: usize, row: usize) -> usize {
        col + row * self.cols
    }

    /// Overwrites every cell from the noise at time `z_off`. Does not touch time.
    pub(crate) fn fill(&mut self, noise: &Noise, z_off: f64) {
        let step = self.params.complexity;
        for row in 0..self.rows {
            let yoff = row as f64 * step;
            for col in 0..self.cols {
                let xoff = col as f64 * step;
                // Two full turns per unit of noise.
                let angle = noise.sample(xoff, yoff, z_off) as f32 * TAU * 2.0;
                let i = self.idx(col, row);
                self.vectors[i] = Vec2::from_angle(angle) * self.params.strength;
            }
        }
    }

    /// Fills the grid for the current time, then advances the time offset.
    pub(crate) fn regenerate(&mut self, noise: &Noise, z_off: &mut f64) {
        self.fill(noise, *z_off);
        *z_off += self.params.time_step;
    }

    pub(crate) fn cell_at(&self, col: i64, row: i64) -> Option<Vec2> {
        if col < 0 || row < 0 || col >= self.cols as i64 || row >= self.rows as i64 {
            return None;
        }
        Some(self.vectors[self.idx(col as usize, row as usize)])
    }

    /// Vector of the cell under a viewport position, if the position is on the grid.
    pub(crate) fn lookup(&self, pos: Vec2) -> Option<Vec2> {
        let col = (pos.x / self.cell_size).floor();
        let row = (pos.y / self.cell_size).floor();
        if !col.is_finite() || !row.is_finite() {
            return None;
        }
        self.cell_at(col as i64, row as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> FieldParams {
        FieldParams {
            strength: 0.5,
            complexity: 0.1,
            time_step: 0.0005,
        }
    }

    #[test]
    fn grid_dimensions_floor_viewport() {
        let f = FlowField::new(219.0, 130.0, 20, params());
        assert_eq!((f.cols(), f.rows()), (10, 6));
        assert_eq!(f.vectors().len(), 60);
    }

    #[test]
    fn every_cell_has_flow_strength() {
        let noise = Noise::new(1);
        let mut f = FlowField::new(400.0, 300.0, 20, params());
        let mut z = 0.0;
        f.regenerate(&noise, &mut z);
        for v in f.vectors() {
            assert!((v.length() - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn fill_is_idempotent_under_frozen_time() {
        let noise = Noise::new(3);
        let mut f = FlowField::new(200.0, 200.0, 20, params());
        f.fill(&noise, 1.25);
        let first = f.vectors().to_vec();
        f.fill(&noise, 1.25);
        assert_eq!(first, f.vectors());
    }

    #[test]
    fn regenerate_advances_time_by_one_step() {
        let noise = Noise::new(3);
        let mut f = FlowField::new(200.0, 200.0, 20, params());
        let mut z = 0.0;
        f.regenerate(&noise, &mut z);
        f.regenerate(&noise, &mut z);
        assert!((z - 0.001).abs() < 1e-12);
    }

    #[test]
    fn zero_complexity_gives_uniform_field() {
        let noise = Noise::new(8);
        let mut f = FlowField::new(
            200.0,
            200.0,
            20,
            FieldParams {
                complexity: 0.0,
                ..params()
            },
        );
        f.fill(&noise, 0.75);
        let first = f.vectors()[0];
        assert!(f.vectors().iter().all(|v| *v == first));
    }

    #[test]
    fn lookup_outside_grid_is_none() {
        let noise = Noise::new(2);
        let mut f = FlowField::new(200.0, 200.0, 20, params());
        f.fill(&noise, 0.0);
        assert!(f.lookup(Vec2::new(-0.5, 10.0)).is_none());
        assert!(f.lookup(Vec2::new(200.0, 10.0)).is_none());
        assert!(f.lookup(Vec2::new(10.0, 250.0)).is_none());
        assert_eq!(f.lookup(Vec2::new(45.0, 61.0)), f.cell_at(2, 3));
    }
}
