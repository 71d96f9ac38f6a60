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
use na::{DMatrix, Point3};
use nalgebra as na;
use tracing::trace;

use crate::affine::AffineOverlay;
use crate::body::Body;
use crate::errors::*;
use crate::jacobian;

/// Active DOF selection of a body: joint indices and affine DOFs
///
/// A body keeps exactly one selection. Every `ActiveJointConfiguration`
/// writes its own selection back before using the body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActiveDofs {
    joint_indices: Vec<usize>,
    affine: AffineOverlay,
}

impl ActiveDofs {
    pub fn new(joint_indices: Vec<usize>, affine: AffineOverlay) -> Self {
        Self {
            joint_indices,
            affine,
        }
    }
    pub fn joint_indices(&self) -> &[usize] {
        &self.joint_indices
    }
    pub fn affine(&self) -> &AffineOverlay {
        &self.affine
    }
    pub fn dof(&self) -> usize {
        self.joint_indices.len() + self.affine.dof_count()
    }
}

impl Body {
    /// Replace the active DOF selection
    ///
    /// # Examples
    ///
    /// ```
    /// use cspace::*;
    ///
    /// let j0 = JointBuilder::new()
    ///     .joint_type(JointType::Rotational { axis: Vector3::z_axis() })
    ///     .into_node();
    /// let body = Body::new("b", Chain::from_root(j0));
    /// body.set_active_dofs(ActiveDofs::new(vec![0], AffineOverlay::default())).unwrap();
    /// assert_eq!(body.active_dof(), 1);
    /// assert!(body.set_active_dofs(ActiveDofs::new(vec![1], AffineOverlay::default())).is_err());
    /// ```
    pub fn set_active_dofs(&self, active: ActiveDofs) -> Result<(), Error> {
        self.check_joint_indices(&active.joint_indices)?;
        self.active_dofs.replace(active);
        Ok(())
    }
    pub fn active_dofs(&self) -> ActiveDofs {
        self.active_dofs.borrow().clone()
    }
    pub fn active_dof(&self) -> usize {
        self.active_dofs.borrow().dof()
    }
    /// Write `active` back if another selection took the slot
    ///
    /// Returns `true` if the selection was changed.
    pub(crate) fn sync_active_dofs(&self, active: &ActiveDofs) -> bool {
        if *self.active_dofs.borrow() == *active {
            return false;
        }
        trace!(body = %self.name(), joints = ?active.joint_indices, "resync active dofs");
        self.active_dofs.replace(active.clone());
        true
    }

    pub fn active_dof_values(&self) -> Vec<f64> {
        let active = self.active_dofs.borrow();
        self.dof_values_for(&active.joint_indices, &active.affine)
    }
    pub fn set_active_dof_values(&self, values: &[f64]) -> Result<(), Error> {
        let active = self.active_dofs();
        self.set_dof_values_for(&active.joint_indices, &active.affine, values)
    }
    pub fn active_dof_limits(&self) -> (Vec<f64>, Vec<f64>) {
        let active = self.active_dofs.borrow();
        self.dof_limits_for(&active.joint_indices, &active.affine)
    }
    /// Position jacobian of a point on the link w.r.t. the active DOFs
    pub fn active_position_jacobian(
        &self,
        link_index: usize,
        point: &Point3<f64>,
    ) -> Result<DMatrix<f64>, Error> {
        let active = self.active_dofs.borrow();
        jacobian::position_jacobian(self, &active.joint_indices, &active.affine, link_index, point)
    }
    /// Angular velocity jacobian of the link w.r.t. the active DOFs
    pub fn active_rotation_jacobian(&self, link_index: usize) -> Result<DMatrix<f64>, Error> {
        let active = self.active_dofs.borrow();
        jacobian::rotation_jacobian(self, &active.joint_indices, &active.affine, link_index)
    }
}
