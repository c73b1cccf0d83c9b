//! Lookup-table interpolation

use crate::circuit::{Circuit, Ports};
use crate::error::{Error, Result};

/// Regular 3D grid holding `components` values per node
///
/// Values are flattened component-major, then x, then y, then z (z varies
/// fastest):
///
/// ```text
/// index(c, ix, iy, iz) = ((c·nx + ix)·ny + iy)·nz + iz
/// ```
#[derive(Debug, Clone)]
pub struct Grid3 {
    values: Vec<f64>,
    components: usize,
    shape: [usize; 3],
    step: [f64; 3],
    origin: [f64; 3],
}

impl Grid3 {
    /// Build a grid, checking the table size against the shape
    pub fn new(
        values: Vec<f64>,
        components: usize,
        shape: [usize; 3],
        step: [f64; 3],
        origin: [f64; 3],
    ) -> Result<Self> {
        let invalid = |message: String| Error::InvalidArgument {
            kind: "i3Dlin",
            message,
        };

        if components == 0 {
            return Err(invalid("at least one component is required".into()));
        }
        if shape.iter().any(|&n| n == 0) {
            return Err(invalid(format!("grid shape {shape:?} has an empty axis")));
        }
        if step.iter().any(|&s| !(s > 0.0) || !s.is_finite()) {
            return Err(invalid(format!("grid steps {step:?} must be positive")));
        }
        let expected = components * shape[0] * shape[1] * shape[2];
        if values.len() != expected {
            return Err(invalid(format!(
                "table holds {} values, expected {expected}",
                values.len()
            )));
        }

        Ok(Self {
            values,
            components,
            shape,
            step,
            origin,
        })
    }

    pub fn components(&self) -> usize {
        self.components
    }

    /// Nodes per component
    pub fn size(&self) -> usize {
        self.shape[0] * self.shape[1] * self.shape[2]
    }

    #[inline]
    fn at(&self, c: usize, ix: usize, iy: usize, iz: usize) -> f64 {
        let [_, ny, nz] = self.shape;
        self.values[((c * self.shape[0] + ix) * ny + iy) * nz + iz]
    }

    /// Lower node index, upper node index and fractional position on one axis.
    /// Coordinates outside the grid are clamped to its faces.
    #[inline]
    fn locate(&self, axis: usize, coord: f64) -> (usize, usize, f64) {
        let n = self.shape[axis];
        if n == 1 {
            return (0, 0, 0.0);
        }
        let u = (coord - self.origin[axis]) / self.step[axis];
        let cell = u.floor().clamp(0.0, (n - 2) as f64);
        let lo = cell as usize;
        let frac = (u - cell).clamp(0.0, 1.0);
        (lo, lo + 1, frac)
    }

    /// Trilinear interpolation of component `c` at (x, y, z)
    pub fn interpolate(&self, c: usize, x: f64, y: f64, z: f64) -> f64 {
        let (x0, x1, xd) = self.locate(0, x);
        let (y0, y1, yd) = self.locate(1, y);
        let (z0, z1, zd) = self.locate(2, z);

        let c00 = self.at(c, x0, y0, z0) * (1.0 - xd) + self.at(c, x1, y0, z0) * xd;
        let c10 = self.at(c, x0, y1, z0) * (1.0 - xd) + self.at(c, x1, y1, z0) * xd;
        let c01 = self.at(c, x0, y0, z1) * (1.0 - xd) + self.at(c, x1, y0, z1) * xd;
        let c11 = self.at(c, x0, y1, z1) * (1.0 - xd) + self.at(c, x1, y1, z1) * xd;

        let c0 = c00 * (1.0 - yd) + c10 * yd;
        let c1 = c01 * (1.0 - yd) + c11 * yd;

        c0 * (1.0 - zd) + c1 * zd
    }
}

/// Trilinear interpolator: 3→K
///
/// # Ports
/// - Inputs 0..3: x, y, z
/// - Output k: component k of the table at (x, y, z)
#[derive(Debug, Clone)]
pub struct Trilinear {
    grid: Grid3,
}

impl Trilinear {
    pub fn new(grid: Grid3) -> Self {
        Self { grid }
    }

    pub fn grid(&self) -> &Grid3 {
        &self.grid
    }
}

impl Circuit for Trilinear {
    fn update(&mut self, ports: &mut Ports<'_>) {
        let (x, y, z) = (ports.input(0), ports.input(1), ports.input(2));
        for c in 0..self.grid.components {
            ports.set_output(c, self.grid.interpolate(c, x, y, z));
        }
    }

    fn params(&self) -> Vec<f64> {
        let mut params = self.grid.step.to_vec();
        params.extend_from_slice(&self.grid.origin);
        params
    }

    fn int_params(&self) -> Vec<i64> {
        let [nx, ny, nz] = self.grid.shape;
        vec![
            self.grid.size() as i64,
            self.grid.components as i64,
            nx as i64,
            ny as i64,
            nz as i64,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::testing::Harness;
    use approx::assert_relative_eq;

    /// Two components sampled from linear functions on a 3x3x3 grid
    fn linear_grid() -> Grid3 {
        let mut values = Vec::new();
        for c in 0..2 {
            for ix in 0..3 {
                for iy in 0..3 {
                    for iz in 0..3 {
                        let (x, y, z) = (ix as f64 * 0.5, iy as f64 * 0.5, 1.0 + iz as f64 * 0.5);
                        let v = if c == 0 { x + 2.0 * y + 3.0 * z } else { x * 10.0 - z };
                        values.push(v);
                    }
                }
            }
        }
        Grid3::new(values, 2, [3, 3, 3], [0.5, 0.5, 0.5], [0.0, 0.0, 1.0]).unwrap()
    }

    #[test]
    fn test_linear_functions_are_reproduced() {
        let grid = linear_grid();
        let (x, y, z) = (0.3, 0.8, 1.9);
        assert_relative_eq!(grid.interpolate(0, x, y, z), x + 2.0 * y + 3.0 * z, epsilon = 1e-12);
        assert_relative_eq!(grid.interpolate(1, x, y, z), x * 10.0 - z, epsilon = 1e-12);
    }

    #[test]
    fn test_nodes_and_upper_face() {
        let grid = linear_grid();
        assert_relative_eq!(grid.interpolate(0, 0.5, 0.5, 1.5), 0.5 + 1.0 + 4.5, epsilon = 1e-12);
        assert_relative_eq!(grid.interpolate(0, 1.0, 1.0, 2.0), 1.0 + 2.0 + 6.0, epsilon = 1e-12);
        // past the upper face clamps to it
        assert_relative_eq!(grid.interpolate(0, 5.0, 1.0, 2.0), 1.0 + 2.0 + 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_table_size_is_checked() {
        let err = Grid3::new(vec![0.0; 7], 1, [2, 2, 2], [1.0; 3], [0.0; 3]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { kind: "i3Dlin", .. }));
        assert!(Grid3::new(vec![0.0; 8], 1, [2, 2, 2], [0.0, 1.0, 1.0], [0.0; 3]).is_err());
    }

    #[test]
    fn test_circuit_emits_every_component() {
        let mut interp = Trilinear::new(linear_grid());
        let mut h = Harness::new(3, 2, 0.01);
        h.set_input(0, 0.25);
        h.set_input(1, 0.25);
        h.set_input(2, 1.25);
        h.step(&mut interp);
        assert_relative_eq!(h.output(0), 0.25 + 0.5 + 3.75, epsilon = 1e-12);
        assert_relative_eq!(h.output(1), 2.5 - 1.25, epsilon = 1e-12);
        assert_eq!(interp.int_params(), vec![27, 2, 3, 3, 3]);
    }
}
