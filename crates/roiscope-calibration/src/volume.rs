//! Scalar image volumes with an index-to-world transform.

use glam::{DMat4, DVec3, UVec3};
use roiscope_core::{Result, RoiscopeError};

/// An inclusive box of voxel indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoxelExtent {
    /// First voxel index along each axis.
    pub min: UVec3,
    /// Last voxel index along each axis.
    pub max: UVec3,
}

impl VoxelExtent {
    /// Number of voxels along each axis.
    pub fn dims(&self) -> UVec3 {
        self.max - self.min + UVec3::ONE
    }

    /// Returns whether a continuous index lies inside the extent, widened by `delta`.
    pub fn contains(&self, ijk: DVec3, delta: f64) -> bool {
        let lo = self.min.as_dvec3() - DVec3::splat(delta);
        let hi = self.max.as_dvec3() + DVec3::splat(delta);
        ijk.cmpge(lo).all() && ijk.cmple(hi).all()
    }
}

/// A 3D scalar image.
///
/// Voxels are stored with the first index varying fastest. The
/// `ijk_to_ras` matrix maps voxel indices to world (RAS) millimetres, so
/// spacing and orientation live in the matrix rather than in the image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageVolume {
    dims: UVec3,
    data: Vec<f32>,
    ijk_to_ras: DMat4,
}

impl ImageVolume {
    /// Creates a volume from voxel data.
    ///
    /// Fails when the data length does not match the dimensions, when a
    /// dimension is zero or when the index-to-world matrix is singular.
    pub fn new(dims: UVec3, data: Vec<f32>, ijk_to_ras: DMat4) -> Result<Self> {
        if dims.cmpeq(UVec3::ZERO).any() {
            return Err(RoiscopeError::InvalidVolume(format!(
                "empty dimensions {dims}"
            )));
        }
        let expected = dims.x as usize * dims.y as usize * dims.z as usize;
        if data.len() != expected {
            return Err(RoiscopeError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        let det = ijk_to_ras.determinant();
        if det == 0.0 || !det.is_finite() {
            return Err(RoiscopeError::InvalidVolume(
                "index-to-world matrix is singular".to_string(),
            ));
        }
        Ok(Self {
            dims,
            data,
            ijk_to_ras,
        })
    }

    /// Creates a volume by evaluating `f` at every voxel index.
    pub fn from_fn<F>(dims: UVec3, ijk_to_ras: DMat4, mut f: F) -> Result<Self>
    where
        F: FnMut(u32, u32, u32) -> f32,
    {
        let mut data = Vec::with_capacity(dims.x as usize * dims.y as usize * dims.z as usize);
        for k in 0..dims.z {
            for j in 0..dims.y {
                for i in 0..dims.x {
                    data.push(f(i, j, k));
                }
            }
        }
        Self::new(dims, data, ijk_to_ras)
    }

    /// Number of voxels along each axis.
    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    /// The whole voxel extent.
    pub fn extent(&self) -> VoxelExtent {
        VoxelExtent {
            min: UVec3::ZERO,
            max: self.dims - UVec3::ONE,
        }
    }

    /// Raw voxel values.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Voxel index to world matrix.
    pub fn ijk_to_ras(&self) -> DMat4 {
        self.ijk_to_ras
    }

    /// World to voxel index matrix.
    pub fn ras_to_ijk(&self) -> DMat4 {
        self.ijk_to_ras.inverse()
    }

    /// Voxel size along each index axis, in millimetres.
    pub fn spacing(&self) -> DVec3 {
        DVec3::new(
            self.ijk_to_ras.x_axis.truncate().length(),
            self.ijk_to_ras.y_axis.truncate().length(),
            self.ijk_to_ras.z_axis.truncate().length(),
        )
    }

    /// Flattens a voxel index.
    pub fn index(&self, i: u32, j: u32, k: u32) -> usize {
        i as usize + self.dims.x as usize * (j as usize + self.dims.y as usize * k as usize)
    }

    /// Value of a voxel.
    pub fn voxel(&self, i: u32, j: u32, k: u32) -> f32 {
        self.data[self.index(i, j, k)]
    }

    /// Sets the value of a voxel.
    pub fn set_voxel(&mut self, i: u32, j: u32, k: u32, value: f32) {
        let index = self.index(i, j, k);
        self.data[index] = value;
    }

    /// Smallest and largest voxel values.
    pub fn scalar_range(&self) -> (f32, f32) {
        self.data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// World position of a voxel center.
    pub fn voxel_to_ras(&self, i: u32, j: u32, k: u32) -> DVec3 {
        self.ijk_to_ras
            .transform_point3(DVec3::new(f64::from(i), f64::from(j), f64::from(k)))
    }

    /// Trilinear sample at a continuous voxel index.
    ///
    /// Positions outside the volume return `background`.
    pub fn sample(&self, ijk: DVec3, background: f64) -> f64 {
        let max = (self.dims - UVec3::ONE).as_dvec3();
        if !(ijk.cmpge(DVec3::ZERO).all() && ijk.cmple(max).all()) {
            return background;
        }
        let base = ijk.floor().min(max);
        let frac = ijk - base;
        let (i0, j0, k0) = (base.x as u32, base.y as u32, base.z as u32);
        let i1 = (i0 + 1).min(self.dims.x - 1);
        let j1 = (j0 + 1).min(self.dims.y - 1);
        let k1 = (k0 + 1).min(self.dims.z - 1);

        let v = |i, j, k| f64::from(self.voxel(i, j, k));
        let lerp = |a: f64, b: f64, t: f64| a + (b - a) * t;
        let c00 = lerp(v(i0, j0, k0), v(i1, j0, k0), frac.x);
        let c10 = lerp(v(i0, j1, k0), v(i1, j1, k0), frac.x);
        let c01 = lerp(v(i0, j0, k1), v(i1, j0, k1), frac.x);
        let c11 = lerp(v(i0, j1, k1), v(i1, j1, k1), frac.x);
        lerp(lerp(c00, c10, frac.y), lerp(c01, c11, frac.y), frac.z)
    }

    /// Trilinear sample at a world position.
    pub fn sample_ras(&self, ras: DVec3, background: f64) -> f64 {
        self.sample(self.ras_to_ijk().transform_point3(ras), background)
    }

    /// Copies a sub-volume; its matrix keeps voxels at the same world positions.
    pub fn extract(&self, extent: &VoxelExtent) -> Self {
        let last = self.dims - UVec3::ONE;
        let min = extent.min.min(last);
        let extent = VoxelExtent {
            min,
            max: extent.max.min(last).max(min),
        };
        let dims = extent.dims();
        let mut data = Vec::with_capacity(dims.x as usize * dims.y as usize * dims.z as usize);
        for k in extent.min.z..=extent.max.z {
            for j in extent.min.y..=extent.max.y {
                for i in extent.min.x..=extent.max.x {
                    data.push(self.voxel(i, j, k));
                }
            }
        }
        Self {
            dims,
            data,
            ijk_to_ras: self.ijk_to_ras * DMat4::from_translation(extent.min.as_dvec3()),
        }
    }

    /// Applies `f` to every voxel, producing a volume on the same grid.
    #[must_use]
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f32) -> f32,
    {
        Self {
            dims: self.dims,
            data: self.data.iter().map(|&v| f(v)).collect(),
            ijk_to_ras: self.ijk_to_ras,
        }
    }

    pub(crate) fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}
