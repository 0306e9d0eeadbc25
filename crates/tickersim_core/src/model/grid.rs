//! N-dimensional grid storage with flat backing array and stride-based indexing.
//!
//! Stores values in row-major order where the last dimension varies fastest,
//! so the trailing dimension of any index prefix is a contiguous slice.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridParts<T>")]
pub struct Grid<T> {
    /// The data stored in row-major order
    data: Vec<T>,
    /// Shape of each dimension (e.g., [1000, 253] for sims x days)
    shape: Vec<usize>,
    /// Precomputed strides for index calculation
    #[serde(skip_serializing)]
    strides: Vec<usize>,
}

/// Serialized form of a [`Grid`]; strides are always recomputed
#[derive(Deserialize)]
struct GridParts<T> {
    data: Vec<T>,
    shape: Vec<usize>,
}

impl<T> TryFrom<GridParts<T>> for Grid<T> {
    type Error = String;

    fn try_from(parts: GridParts<T>) -> Result<Self, Self::Error> {
        let len = parts.data.len();
        let expected: usize = parts.shape.iter().product();
        Grid::from_data(parts.shape, parts.data)
            .ok_or_else(|| format!("grid data has {len} values, shape needs {expected}"))
    }
}

/// Compute row-major strides for a shape
fn compute_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

impl<T: Clone> Grid<T> {
    /// Create a new grid with the given shape, filled with the default value.
    pub fn new(shape: Vec<usize>, default: T) -> Self {
        let total_size: usize = shape.iter().product();
        let strides = compute_strides(&shape);
        Self {
            data: vec![default; total_size],
            shape,
            strides,
        }
    }
}

impl<T> Grid<T> {
    /// Create a grid from existing data. Data must be in row-major order.
    pub fn from_data(shape: Vec<usize>, data: Vec<T>) -> Option<Self> {
        let total_size: usize = shape.iter().product();
        if data.len() != total_size {
            return None;
        }
        let strides = compute_strides(&shape);
        Some(Self {
            data,
            shape,
            strides,
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Convert multi-dimensional indices to flat index
    pub fn flat_index(&self, indices: &[usize]) -> Option<usize> {
        if indices.len() != self.shape.len() {
            return None;
        }
        let mut flat = 0;
        for (i, (&idx, &size)) in indices.iter().zip(&self.shape).enumerate() {
            if idx >= size {
                return None;
            }
            flat += idx * self.strides[i];
        }
        Some(flat)
    }

    pub fn get(&self, indices: &[usize]) -> Option<&T> {
        self.flat_index(indices).map(|i| &self.data[i])
    }

    pub fn get_mut(&mut self, indices: &[usize]) -> Option<&mut T> {
        self.flat_index(indices).map(|i| &mut self.data[i])
    }

    /// Contiguous run of the last dimension for a prefix of leading indices.
    ///
    /// `prefix` must fix every dimension except the last.
    pub fn lane(&self, prefix: &[usize]) -> Option<&[T]> {
        let start = self.lane_start(prefix)?;
        let width = *self.shape.last()?;
        Some(&self.data[start..start + width])
    }

    pub fn lane_mut(&mut self, prefix: &[usize]) -> Option<&mut [T]> {
        let start = self.lane_start(prefix)?;
        let width = *self.shape.last()?;
        Some(&mut self.data[start..start + width])
    }

    fn lane_start(&self, prefix: &[usize]) -> Option<usize> {
        if self.shape.is_empty() || prefix.len() != self.shape.len() - 1 {
            return None;
        }
        let mut flat = 0;
        for (i, &idx) in prefix.iter().enumerate() {
            if idx >= self.shape[i] {
                return None;
            }
            flat += idx * self.strides[i];
        }
        Some(flat)
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }
}
