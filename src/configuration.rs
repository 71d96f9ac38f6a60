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
//! Common interface of the configurations
use na::{DMatrix, Point3, Vector3};
use nalgebra as na;
use std::rc::Rc;
use tracing::{error, trace};

use crate::affine::AffineDofs;
use crate::body::{AffectedLink, Body, LinkRef};
use crate::environment::Environment;
use crate::errors::*;

/// What a saver restores on drop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaverScope {
    /// Only the DOF vector of the configuration
    DofValues,
    /// The placement and all joint positions of the body
    BodyState,
}

/// Guard which restores a snapshot of the state when dropped
pub trait Saver {
    /// `DofValues` restores the DOF vector only, `BodyState` the whole body
    fn scope(&self) -> SaverScope;
}

/// A vector of DOFs which moves some bodies of an environment
///
/// The DOF vector is the ordered list of the selected joint positions
/// followed by the selected affine values. Every method takes `&self`, the
/// state lives in the bodies.
pub trait Configuration {
    /// Move the bodies to `values`
    ///
    /// Values outside the limits are applied as they are. `values` must have
    /// `dof()` elements.
    fn set_dof_values(&self, values: &[f64]) -> Result<(), Error>;
    fn get_dof_values(&self) -> Vec<f64>;
    /// `(lower, upper)`, both of `dof()` elements
    fn get_dof_limits(&self) -> (Vec<f64>, Vec<f64>);
    fn dof(&self) -> usize;
    fn affine_dofs(&self) -> AffineDofs;
    /// The environment of the bodies
    fn env(&self) -> Result<Environment, Error>;
    /// `dof() x 3` jacobian of the world `point` attached to the link
    fn position_jacobian(&self, link_index: usize, point: &Point3<f64>)
        -> Result<DMatrix<f64>, Error>;
    /// `dof() x 3` angular velocity jacobian of the link
    ///
    /// `axis` is accepted for interface compatibility and does not change
    /// the result.
    fn rotation_jacobian(&self, link_index: usize, axis: &Vector3<f64>)
        -> Result<DMatrix<f64>, Error>;
    /// `true` if changing the DOFs can move the link
    fn does_affect(&self, link: &LinkRef) -> bool;
    /// Controlled body followed by the bodies it grabs
    fn bodies(&self) -> Vec<Rc<Body>>;
    fn affected_links(&self) -> Vec<LinkRef> {
        self.affected_links_filtered(false)
            .into_iter()
            .map(|affected| affected.link)
            .collect()
    }
    /// Affected links with the jacobian link and the closest DOF of each
    fn affected_links_filtered(&self, only_with_geometry: bool) -> Vec<AffectedLink>;
    /// Uniform sample inside the limits
    fn random_dof_values(&self) -> Result<Vec<f64>, Error>;
    /// Snapshot restored when the returned saver is dropped
    fn save(&self) -> Box<dyn Saver + '_> {
        Box::new(GenericSaver::new(self))
    }
}

/// Saver of the DOF vector of any configuration
///
/// # Examples
///
/// ```
/// use cspace::*;
///
/// let j0 = JointBuilder::new()
///     .joint_type(JointType::Rotational { axis: Vector3::z_axis() })
///     .into_node();
/// let env = Environment::new();
/// let body = env.add_body(Body::new("b", Chain::from_root(j0)));
/// let config = ActiveJointConfiguration::new(body, vec![0]).unwrap();
/// {
///     let saver = GenericSaver::new(&config);
///     assert_eq!(saver.dof_values(), &[0.0]);
///     config.set_dof_values(&[0.8]).unwrap();
/// }
/// assert_eq!(config.get_dof_values(), vec![0.0]);
/// ```
pub struct GenericSaver<'a, C>
where
    C: Configuration + ?Sized,
{
    parent: &'a C,
    dof_values: Vec<f64>,
}

impl<'a, C> GenericSaver<'a, C>
where
    C: Configuration + ?Sized,
{
    pub fn new(parent: &'a C) -> Self {
        Self {
            dof_values: parent.get_dof_values(),
            parent,
        }
    }
    /// The saved values
    pub fn dof_values(&self) -> &[f64] {
        &self.dof_values
    }
}

impl<'a, C> Saver for GenericSaver<'a, C>
where
    C: Configuration + ?Sized,
{
    fn scope(&self) -> SaverScope {
        SaverScope::DofValues
    }
}

impl<'a, C> Drop for GenericSaver<'a, C>
where
    C: Configuration + ?Sized,
{
    fn drop(&mut self) {
        match self.parent.set_dof_values(&self.dof_values) {
            Ok(()) => trace!("restored {} dof values", self.dof_values.len()),
            Err(err) => error!("failed to restore dof values: {err}"),
        }
    }
}
