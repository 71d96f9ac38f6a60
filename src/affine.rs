/*
  Copyright 2020 Takashi Ogura

  Licensed under the Apache License, Version 2.0 (the "License");
  you may not use this file except in compliance with the License.
  You may obtain a copy of the License at

      http://www.apache.org/licenses/LICENSE-2.0

  Unless required by applicable law or agreed to in writing, software
  distributed under the License is distributed on an "AS IS" BASIS,
  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
  See the License for the specific language governing permissions and
  limitations under the License.
*/
//! Virtual degrees of freedom for the free placement of a body
//!
//! The affine DOFs are always appended after the joint DOFs, in the order
//! `[x, y, z, rotation(s)]`, each only if it is selected.
use na::{Isometry3, Matrix3, Translation3, Unit, UnitQuaternion, Vector3};
use nalgebra as na;
use std::f64::consts::PI;

use crate::errors::*;

bitflags::bitflags! {
    /// Selection of the affine dimensions
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AffineDofs: u32 {
        /// Translation along world X
        const X = 0b0000_0001;
        /// Translation along world Y
        const Y = 0b0000_0010;
        /// Translation along world Z
        const Z = 0b0000_0100;
        /// One rotation around a fixed world axis
        const ROTATION_AXIS = 0b0000_1000;
        /// Full rotation, as a rotation vector (axis * angle)
        const ROTATION_3D = 0b0001_0000;
        /// X, Y and Z
        const TRANSLATION = Self::X.bits() | Self::Y.bits() | Self::Z.bits();
        /// X, Y and the rotation around the axis
        const PLANAR = Self::X.bits() | Self::Y.bits() | Self::ROTATION_AXIS.bits();
        /// Translation and full rotation
        const TRANSFORM = Self::TRANSLATION.bits() | Self::ROTATION_3D.bits();
    }
}

impl AffineDofs {
    /// Number of DOFs represented by the selection
    ///
    /// # Examples
    ///
    /// ```
    /// use cspace::AffineDofs;
    ///
    /// assert_eq!(AffineDofs::empty().dof_count(), 0);
    /// assert_eq!(AffineDofs::PLANAR.dof_count(), 3);
    /// assert_eq!(AffineDofs::TRANSFORM.dof_count(), 6);
    /// ```
    pub fn dof_count(&self) -> usize {
        let translation = [AffineDofs::X, AffineDofs::Y, AffineDofs::Z]
            .iter()
            .filter(|dof| self.contains(**dof))
            .count();
        translation + self.rotation_dof_count()
    }

    fn rotation_dof_count(&self) -> usize {
        if self.contains(AffineDofs::ROTATION_3D) {
            3
        } else if self.contains(AffineDofs::ROTATION_AXIS) {
            1
        } else {
            0
        }
    }

    fn translation_axes(&self) -> impl Iterator<Item = usize> + '_ {
        [AffineDofs::X, AffineDofs::Y, AffineDofs::Z]
            .into_iter()
            .enumerate()
            .filter(move |(_, dof)| self.contains(*dof))
            .map(|(axis, _)| axis)
    }
}

/// Affine DOFs with the axis used by `ROTATION_AXIS`
#[derive(Debug, Clone, PartialEq)]
pub struct AffineOverlay {
    dofs: AffineDofs,
    rotation_axis: Unit<Vector3<f64>>,
}

impl Default for AffineOverlay {
    fn default() -> Self {
        Self {
            dofs: AffineDofs::empty(),
            rotation_axis: Vector3::z_axis(),
        }
    }
}

impl AffineOverlay {
    /// Create the overlay
    ///
    /// It fails if both `ROTATION_AXIS` and `ROTATION_3D` are selected.
    ///
    /// # Examples
    ///
    /// ```
    /// use cspace::{AffineDofs, AffineOverlay, Vector3};
    ///
    /// assert!(AffineOverlay::new(AffineDofs::PLANAR, Vector3::z_axis()).is_ok());
    /// assert!(AffineOverlay::new(
    ///     AffineDofs::ROTATION_AXIS | AffineDofs::ROTATION_3D,
    ///     Vector3::z_axis()
    /// )
    /// .is_err());
    /// ```
    pub fn new(dofs: AffineDofs, rotation_axis: Unit<Vector3<f64>>) -> Result<Self, Error> {
        if dofs.contains(AffineDofs::ROTATION_AXIS | AffineDofs::ROTATION_3D) {
            return Err(Error::InvalidAffineDofsError(dofs));
        }
        Ok(Self {
            dofs,
            rotation_axis,
        })
    }
    pub fn dofs(&self) -> AffineDofs {
        self.dofs
    }
    pub fn rotation_axis(&self) -> &Unit<Vector3<f64>> {
        &self.rotation_axis
    }
    pub fn dof_count(&self) -> usize {
        self.dofs.dof_count()
    }
    pub fn is_empty(&self) -> bool {
        self.dofs.is_empty()
    }

    /// Extract the selected affine values from a placement
    pub fn values_from_transform(&self, transform: &Isometry3<f64>) -> Vec<f64> {
        let mut values = self
            .dofs
            .translation_axes()
            .map(|axis| transform.translation.vector[axis])
            .collect::<Vec<_>>();
        if self.dofs.contains(AffineDofs::ROTATION_3D) {
            values.extend(transform.rotation.scaled_axis().iter().copied());
        } else if self.dofs.contains(AffineDofs::ROTATION_AXIS) {
            values.push(transform.rotation.scaled_axis().dot(&self.rotation_axis));
        }
        values
    }

    /// Overwrite the selected components of the placement with `values`
    ///
    /// Unselected translation components are kept. Any selected rotation
    /// replaces the whole rotation. `values` must have `dof_count()` elements.
    ///
    /// # Examples
    ///
    /// ```
    /// use cspace::{AffineDofs, AffineOverlay, Isometry3, Vector3};
    ///
    /// let overlay = AffineOverlay::new(AffineDofs::X | AffineDofs::ROTATION_AXIS, Vector3::z_axis()).unwrap();
    /// let mut placement = Isometry3::translation(0.0, 0.0, 1.0);
    /// overlay.apply_to_transform(&mut placement, &[0.5, 0.3]);
    /// assert_eq!(placement.translation.vector.x, 0.5);
    /// assert_eq!(placement.translation.vector.z, 1.0);
    /// assert!((placement.rotation.angle() - 0.3).abs() < 1e-10);
    /// ```
    pub fn apply_to_transform(&self, transform: &mut Isometry3<f64>, values: &[f64]) {
        let mut values = values.iter().copied();
        for axis in self.dofs.translation_axes() {
            if let Some(value) = values.next() {
                transform.translation.vector[axis] = value;
            }
        }
        if self.dofs.contains(AffineDofs::ROTATION_3D) {
            let rotation_vector = Vector3::from_iterator(values.by_ref().take(3));
            transform.rotation = UnitQuaternion::from_scaled_axis(rotation_vector);
        } else if self.dofs.contains(AffineDofs::ROTATION_AXIS) {
            if let Some(angle) = values.next() {
                transform.rotation = UnitQuaternion::from_axis_angle(&self.rotation_axis, angle);
            }
        }
    }

    /// Build a placement from the identity and `values`
    pub fn transform_from_values(&self, values: &[f64]) -> Isometry3<f64> {
        let mut transform = Isometry3::from_parts(Translation3::identity(), UnitQuaternion::identity());
        self.apply_to_transform(&mut transform, values);
        transform
    }

    /// Limits of the affine DOFs
    ///
    /// Translations are unbounded. Rotations are bounded to the range which
    /// reads back unchanged: `[-pi, pi]` for `ROTATION_AXIS`, and the cube
    /// inscribed in the ball of radius `pi` for each `ROTATION_3D` component.
    ///
    /// # Examples
    ///
    /// ```
    /// use cspace::{AffineDofs, AffineOverlay, Vector3};
    /// use std::f64::consts::PI;
    ///
    /// let overlay = AffineOverlay::new(AffineDofs::PLANAR, Vector3::z_axis()).unwrap();
    /// let (lower, upper) = overlay.limits();
    /// assert_eq!(lower, vec![f64::NEG_INFINITY, f64::NEG_INFINITY, -PI]);
    /// assert_eq!(upper, vec![f64::INFINITY, f64::INFINITY, PI]);
    /// ```
    pub fn limits(&self) -> (Vec<f64>, Vec<f64>) {
        let num_translation = self.dofs.translation_axes().count();
        let rotation_bound = if self.dofs.contains(AffineDofs::ROTATION_3D) {
            PI / 3f64.sqrt()
        } else {
            PI
        };
        let num_rotation = self.dofs.rotation_dof_count();
        let mut lower = vec![f64::NEG_INFINITY; num_translation];
        let mut upper = vec![f64::INFINITY; num_translation];
        lower.extend(std::iter::repeat(-rotation_bound).take(num_rotation));
        upper.extend(std::iter::repeat(rotation_bound).take(num_rotation));
        (lower, upper)
    }

    /// World linear velocity directions of the translation DOFs
    pub(crate) fn translation_directions(&self) -> Vec<Vector3<f64>> {
        self.dofs
            .translation_axes()
            .map(|axis| {
                let mut direction = Vector3::zeros();
                direction[axis] = 1.0;
                direction
            })
            .collect()
    }

    /// World angular velocity per unit rate of each rotation DOF
    ///
    /// For `ROTATION_3D` the columns of the left jacobian of SO(3) at the
    /// current rotation vector.
    pub(crate) fn rotation_rate_axes(&self, rotation: &UnitQuaternion<f64>) -> Vec<Vector3<f64>> {
        if self.dofs.contains(AffineDofs::ROTATION_3D) {
            let jl = so3_left_jacobian(&rotation.scaled_axis());
            (0..3).map(|i| jl.column(i).into_owned()).collect()
        } else if self.dofs.contains(AffineDofs::ROTATION_AXIS) {
            vec![self.rotation_axis.into_inner()]
        } else {
            Vec::new()
        }
    }
}

/// `exp([v + dv]) ~= exp([J dv]) exp([v])`
fn so3_left_jacobian(v: &Vector3<f64>) -> Matrix3<f64> {
    let theta = v.norm();
    let skew = v.cross_matrix();
    let (a, b) = if theta < 1e-6 {
        (0.5 - theta * theta / 24.0, 1.0 / 6.0 - theta * theta / 120.0)
    } else {
        let theta2 = theta * theta;
        (
            (1.0 - theta.cos()) / theta2,
            (theta - theta.sin()) / (theta2 * theta),
        )
    };
    Matrix3::identity() + skew * a + skew * skew * b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_round_trip() {
        let overlay = AffineOverlay::new(AffineDofs::TRANSFORM, Vector3::z_axis()).unwrap();
        assert_eq!(overlay.dof_count(), 6);
        let values = [0.1, -0.2, 0.3, 0.2, -0.4, 0.5];
        let transform = overlay.transform_from_values(&values);
        let out = overlay.values_from_transform(&transform);
        assert_eq!(out.len(), 6);
        for (a, b) in values.iter().zip(out.iter()) {
            assert!((a - b).abs() < 1e-10);
        }
    }

    #[test]
    fn test_rotation_axis_keeps_other_translation() {
        let overlay = AffineOverlay::new(AffineDofs::PLANAR, Vector3::y_axis()).unwrap();
        let mut transform = Isometry3::translation(1.0, 2.0, 3.0);
        overlay.apply_to_transform(&mut transform, &[-1.0, 0.5, -0.7]);
        assert_eq!(transform.translation.vector, Vector3::new(-1.0, 0.5, 3.0));
        let out = overlay.values_from_transform(&transform);
        assert!((out[2] + 0.7).abs() < 1e-10);
    }

    #[test]
    fn test_left_jacobian() {
        let v = Vector3::new(0.3, -0.2, 0.6);
        let jl = so3_left_jacobian(&v);
        let eps = 1e-7;
        let r0 = UnitQuaternion::from_scaled_axis(v);
        for i in 0..3 {
            let mut dv = Vector3::zeros();
            dv[i] = eps;
            let r1 = UnitQuaternion::from_scaled_axis(v + dv);
            let dq = r1 * r0.inverse();
            let omega = dq.imag() * (2.0 * dq.w.signum()) / eps;
            assert!((omega - jl.column(i)).norm() < 1e-5);
        }
        let small = so3_left_jacobian(&Vector3::new(1e-9, 0.0, 0.0));
        assert!((small - Matrix3::identity()).norm() < 1e-8);
    }

    #[test]
    fn test_rotation_limits_read_back() {
        let overlay = AffineOverlay::new(AffineDofs::ROTATION_AXIS, Vector3::x_axis()).unwrap();
        assert_eq!(overlay.limits(), (vec![-PI], vec![PI]));
        // outside of the limits the angle is wrapped
        let out = overlay.values_from_transform(&overlay.transform_from_values(&[4.0]));
        assert!((out[0] - (4.0 - 2.0 * PI)).abs() < 1e-10);

        let overlay = AffineOverlay::new(AffineDofs::TRANSFORM, Vector3::z_axis()).unwrap();
        let (lower, upper) = overlay.limits();
        assert_eq!(lower[..3], [f64::NEG_INFINITY; 3]);
        assert_eq!(upper[..3], [f64::INFINITY; 3]);
        // the corner of the cube is the farthest rotation vector
        let corner = [0.0, 0.0, 0.0, upper[3], lower[4], upper[5]];
        assert!((Vector3::new(corner[3], corner[4], corner[5]).norm() - PI).abs() < 1e-12);
        let inside = [0.0, 0.0, 0.0, upper[3] * 0.99, lower[4] * 0.99, upper[5] * 0.99];
        let out = overlay.values_from_transform(&overlay.transform_from_values(&inside));
        for (a, b) in inside.iter().zip(out.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_translation_limits_are_unbounded() {
        let overlay = AffineOverlay::new(AffineDofs::X | AffineDofs::Z, Vector3::z_axis()).unwrap();
        let (lower, upper) = overlay.limits();
        assert_eq!(lower, vec![f64::NEG_INFINITY; 2]);
        assert_eq!(upper, vec![f64::INFINITY; 2]);
    }
}
