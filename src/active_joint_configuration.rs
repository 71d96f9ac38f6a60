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
use na::{DMatrix, Point3, Vector3};
use nalgebra as na;
use rand::Rng;
use std::f64::consts::PI;
use std::rc::Rc;

use crate::active_dofs::ActiveDofs;
use crate::affine::{AffineDofs, AffineOverlay};
use crate::body::{AffectedLink, Body, LinkRef};
use crate::configuration::Configuration;
use crate::environment::Environment;
use crate::errors::*;

/// Bound used for sampling DOFs without a finite limit
const UNBOUNDED_SAMPLING_RANGE: f64 = 2.0 * PI;

/// A chosen list of joints of one body, optionally with affine DOFs
///
/// The DOF vector follows the order of `joint_indices`, then the affine
/// values. The body has a single active DOF slot which any configuration
/// may overwrite, so every DOF operation writes this selection back first.
///
/// # Examples
///
/// ```
/// use cspace::*;
///
/// let j0 = JointBuilder::new()
///     .name("j0")
///     .joint_type(JointType::Rotational { axis: Vector3::z_axis() })
///     .limits(Some((-1.0..=1.0).into()))
///     .into_node();
/// let j1 = JointBuilder::new()
///     .name("j1")
///     .translation(Translation3::new(1.0, 0.0, 0.0))
///     .joint_type(JointType::Rotational { axis: Vector3::z_axis() })
///     .into_node();
/// connect![j0 => j1];
/// let env = Environment::new();
/// let body = env.add_body(Body::new("arm", Chain::from_root(j0)));
///
/// let config = ActiveJointConfiguration::new(body.clone(), vec![1, 0]).unwrap();
/// config.set_dof_values(&[0.5, 0.1]).unwrap();
/// assert_eq!(body.chain().joint_positions(), vec![0.1, 0.5]);
/// let (lower, upper) = config.get_dof_limits();
/// assert_eq!(lower[1], -1.0);
/// assert_eq!(upper[0], f64::INFINITY);
/// ```
#[derive(Debug, Clone)]
pub struct ActiveJointConfiguration {
    body: Rc<Body>,
    active: ActiveDofs,
}

impl ActiveJointConfiguration {
    /// Fails if an index is out of range or duplicated
    pub fn new(body: Rc<Body>, joint_indices: Vec<usize>) -> Result<Self, Error> {
        body.check_joint_indices(&joint_indices)?;
        Ok(Self {
            body,
            active: ActiveDofs::new(joint_indices, AffineOverlay::default()),
        })
    }
    /// Add the affine DOFs after the joints
    pub fn with_affine(self, affine: AffineOverlay) -> Self {
        let joint_indices = self.active.joint_indices().to_vec();
        Self {
            body: self.body,
            active: ActiveDofs::new(joint_indices, affine),
        }
    }
    pub fn body(&self) -> &Rc<Body> {
        &self.body
    }
    pub fn joint_indices(&self) -> &[usize] {
        self.active.joint_indices()
    }
    /// Make this selection the active DOFs of the body
    pub fn sync_active_dofs(&self) {
        self.body.sync_active_dofs(&self.active);
    }
    /// Uniform sample inside the limits using `rng`
    ///
    /// Infinite bounds are replaced by `+-2pi`, or by the finite bound
    /// shifted by `2pi` when it lies outside of that range.
    ///
    /// # Examples
    ///
    /// ```
    /// use cspace::*;
    /// use rand::SeedableRng;
    ///
    /// let j0 = JointBuilder::new()
    ///     .joint_type(JointType::Linear { axis: Vector3::x_axis() })
    ///     .limits(Some((0.0..=0.5).into()))
    ///     .into_node();
    /// let body = std::rc::Rc::new(Body::new("b", Chain::from_root(j0)));
    /// let config = ActiveJointConfiguration::new(body, vec![0]).unwrap();
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
    /// let values = config.random_dof_values_with(&mut rng);
    /// assert!(values[0] >= 0.0 && values[0] <= 0.5);
    /// ```
    pub fn random_dof_values_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        let (lower, upper) = self.get_dof_limits();
        lower
            .into_iter()
            .zip(upper)
            .map(|(lo, hi)| {
                let lo = if lo.is_finite() {
                    lo
                } else if hi > -UNBOUNDED_SAMPLING_RANGE {
                    -UNBOUNDED_SAMPLING_RANGE
                } else {
                    hi - UNBOUNDED_SAMPLING_RANGE
                };
                let hi = if hi.is_finite() {
                    hi
                } else if lo < UNBOUNDED_SAMPLING_RANGE {
                    UNBOUNDED_SAMPLING_RANGE
                } else {
                    lo + UNBOUNDED_SAMPLING_RANGE
                };
                if lo < hi {
                    rng.gen_range(lo..=hi)
                } else {
                    lo
                }
            })
            .collect()
    }
}

impl Configuration for ActiveJointConfiguration {
    fn set_dof_values(&self, values: &[f64]) -> Result<(), Error> {
        self.sync_active_dofs();
        self.body.set_active_dof_values(values)
    }
    fn get_dof_values(&self) -> Vec<f64> {
        self.sync_active_dofs();
        self.body.active_dof_values()
    }
    fn get_dof_limits(&self) -> (Vec<f64>, Vec<f64>) {
        self.sync_active_dofs();
        self.body.active_dof_limits()
    }
    fn dof(&self) -> usize {
        self.active.dof()
    }
    fn affine_dofs(&self) -> AffineDofs {
        self.active.affine().dofs()
    }
    fn env(&self) -> Result<Environment, Error> {
        self.body.env()
    }
    fn position_jacobian(
        &self,
        link_index: usize,
        point: &Point3<f64>,
    ) -> Result<DMatrix<f64>, Error> {
        self.sync_active_dofs();
        self.body.active_position_jacobian(link_index, point)
    }
    fn rotation_jacobian(
        &self,
        link_index: usize,
        _axis: &Vector3<f64>,
    ) -> Result<DMatrix<f64>, Error> {
        self.sync_active_dofs();
        self.body.active_rotation_jacobian(link_index)
    }
    fn does_affect(&self, link: &LinkRef) -> bool {
        self.body
            .does_affect_link(self.active.joint_indices(), self.active.affine(), link)
    }
    fn bodies(&self) -> Vec<Rc<Body>> {
        self.body.bodies()
    }
    fn affected_links_filtered(&self, only_with_geometry: bool) -> Vec<AffectedLink> {
        self.body.affected_links_for(
            self.active.joint_indices(),
            self.active.affine(),
            only_with_geometry,
        )
    }
    fn random_dof_values(&self) -> Result<Vec<f64>, Error> {
        Ok(self.random_dof_values_with(&mut rand::thread_rng()))
    }
}
