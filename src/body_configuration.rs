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
use std::rc::Rc;
use tracing::error;

use crate::affine::{AffineDofs, AffineOverlay};
use crate::body::{AffectedLink, Body, LinkRef};
use crate::configuration::{Configuration, Saver};
use crate::environment::Environment;
use crate::errors::*;
use crate::jacobian;

pub(crate) fn unsupported(operation: &'static str, configuration: &'static str) -> Error {
    error!("{operation} is not supported by {configuration}");
    Error::UnsupportedOperationError {
        operation,
        configuration,
    }
}

/// All the joints of one body, optionally with affine DOFs
///
/// The DOF vector is every joint position in joint index order, then the
/// affine values. `save()` snapshots the whole body state.
///
/// # Examples
///
/// ```
/// use cspace::*;
///
/// let j0 = JointBuilder::new()
///     .joint_type(JointType::Linear { axis: Vector3::z_axis() })
///     .into_node();
/// let env = Environment::new();
/// let body = env.add_body(Body::new("lift", Chain::from_root(j0)));
/// let config = BodyConfiguration::new(body.clone())
///     .with_affine(AffineOverlay::new(AffineDofs::X | AffineDofs::Y, Vector3::z_axis()).unwrap());
/// assert_eq!(config.dof(), 3);
/// config.set_dof_values(&[0.3, 1.0, 2.0]).unwrap();
/// assert_eq!(body.transform().translation.vector, Vector3::new(1.0, 2.0, 0.0));
/// assert!(config.random_dof_values().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct BodyConfiguration {
    body: Rc<Body>,
    joint_indices: Vec<usize>,
    affine: AffineOverlay,
}

impl BodyConfiguration {
    pub fn new(body: Rc<Body>) -> Self {
        let joint_indices = (0..body.dof()).collect();
        Self {
            body,
            joint_indices,
            affine: AffineOverlay::default(),
        }
    }
    /// Add the affine DOFs after the joints
    pub fn with_affine(mut self, affine: AffineOverlay) -> Self {
        self.affine = affine;
        self
    }
    pub fn body(&self) -> &Rc<Body> {
        &self.body
    }
    pub fn affine(&self) -> &AffineOverlay {
        &self.affine
    }
}

impl Configuration for BodyConfiguration {
    fn set_dof_values(&self, values: &[f64]) -> Result<(), Error> {
        self.body
            .set_dof_values_for(&self.joint_indices, &self.affine, values)
    }
    fn get_dof_values(&self) -> Vec<f64> {
        self.body.dof_values_for(&self.joint_indices, &self.affine)
    }
    fn get_dof_limits(&self) -> (Vec<f64>, Vec<f64>) {
        self.body.dof_limits_for(&self.joint_indices, &self.affine)
    }
    fn dof(&self) -> usize {
        self.joint_indices.len() + self.affine.dof_count()
    }
    fn affine_dofs(&self) -> AffineDofs {
        self.affine.dofs()
    }
    fn env(&self) -> Result<Environment, Error> {
        self.body.env()
    }
    fn position_jacobian(
        &self,
        link_index: usize,
        point: &Point3<f64>,
    ) -> Result<DMatrix<f64>, Error> {
        jacobian::position_jacobian(
            &self.body,
            &self.joint_indices,
            &self.affine,
            link_index,
            point,
        )
    }
    fn rotation_jacobian(
        &self,
        _link_index: usize,
        _axis: &Vector3<f64>,
    ) -> Result<DMatrix<f64>, Error> {
        Err(unsupported("rotation_jacobian", "BodyConfiguration"))
    }
    fn does_affect(&self, link: &LinkRef) -> bool {
        self.body
            .does_affect_link(&self.joint_indices, &self.affine, link)
    }
    fn bodies(&self) -> Vec<Rc<Body>> {
        self.body.bodies()
    }
    fn affected_links_filtered(&self, only_with_geometry: bool) -> Vec<AffectedLink> {
        self.body
            .affected_links_for(&self.joint_indices, &self.affine, only_with_geometry)
    }
    fn random_dof_values(&self) -> Result<Vec<f64>, Error> {
        Err(unsupported("random_dof_values", "BodyConfiguration"))
    }
    fn save(&self) -> Box<dyn Saver + '_> {
        Box::new(self.body.state_saver())
    }
}
