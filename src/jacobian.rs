/*
  Copyright 2017 Takashi Ogura

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
//! Jacobians of a body over a list of DOFs
//!
//! Both functions return a `dof x 3` matrix: the row `i` is the derivative of
//! the world quantity w.r.t. the DOF `i` (joints first, then affine DOFs).
use na::{DMatrix, Isometry3, Point3, Vector3};
use nalgebra as na;

use crate::affine::AffineOverlay;
use crate::body::Body;
use crate::errors::*;
use crate::joint::JointType;

/// World frame of the joint if it moves the link
fn upstream_joint(
    body: &Body,
    transforms: &[Isometry3<f64>],
    joint_index: usize,
    link_index: usize,
) -> Option<(Isometry3<f64>, JointType<f64>)> {
    let chain = body.chain();
    let joint_link = chain.joint_link_index(joint_index)?;
    if !chain.is_ancestor_or_self(joint_link, link_index) {
        return None;
    }
    let joint_type = chain.joint_node(joint_index)?.joint().joint_type;
    Some((transforms[joint_link], joint_type))
}

fn rows_to_matrix(rows: &[Vector3<f64>]) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), 3, |r, c| rows[r][c])
}

/// Linear velocity of the world `point`, rigidly attached to the link
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
/// let jacobian = jacobian::position_jacobian(
///     &body,
///     &[0],
///     &AffineOverlay::default(),
///     0,
///     &Point3::new(1.0, 0.0, 0.0),
/// )
/// .unwrap();
/// assert_eq!(jacobian.shape(), (1, 3));
/// assert_eq!(jacobian[(0, 1)], 1.0);
/// ```
pub fn position_jacobian(
    body: &Body,
    joint_indices: &[usize],
    affine: &AffineOverlay,
    link_index: usize,
    point: &Point3<f64>,
) -> Result<DMatrix<f64>, Error> {
    body.check_link_index(link_index)?;
    body.check_joint_indices(joint_indices)?;
    let transforms = body.link_transforms();
    let mut rows = joint_indices
        .iter()
        .map(
            |&joint_index| match upstream_joint(body, &transforms, joint_index, link_index) {
                Some((t_i, JointType::Rotational { axis })) => {
                    let a_i = t_i.rotation * axis;
                    a_i.cross(&(point.coords - t_i.translation.vector))
                }
                Some((t_i, JointType::Linear { axis })) => t_i.rotation * axis.into_inner(),
                _ => Vector3::zeros(),
            },
        )
        .collect::<Vec<_>>();
    // dp = e for the translations, w x (p - t) for the rotations
    let base = body.transform();
    rows.extend(affine.translation_directions());
    rows.extend(
        affine
            .rotation_rate_axes(&base.rotation)
            .iter()
            .map(|w| w.cross(&(point.coords - base.translation.vector))),
    );
    Ok(rows_to_matrix(&rows))
}

/// Angular velocity of the link
pub fn rotation_jacobian(
    body: &Body,
    joint_indices: &[usize],
    affine: &AffineOverlay,
    link_index: usize,
) -> Result<DMatrix<f64>, Error> {
    body.check_link_index(link_index)?;
    body.check_joint_indices(joint_indices)?;
    let transforms = body.link_transforms();
    let mut rows = joint_indices
        .iter()
        .map(
            |&joint_index| match upstream_joint(body, &transforms, joint_index, link_index) {
                Some((t_i, JointType::Rotational { axis })) => t_i.rotation * axis.into_inner(),
                _ => Vector3::zeros(),
            },
        )
        .collect::<Vec<_>>();
    let base = body.transform();
    rows.extend(affine.translation_directions().iter().map(|_| Vector3::zeros()));
    rows.extend(affine.rotation_rate_axes(&base.rotation));
    Ok(rows_to_matrix(&rows))
}
