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
//! Articulated body placed in the world
use na::Isometry3;
use nalgebra as na;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{trace, warn};

use crate::active_dofs::ActiveDofs;
use crate::affine::AffineOverlay;
use crate::chain::Chain;
use crate::configuration::{Saver, SaverScope};
use crate::environment::{Environment, EnvironmentImpl};
use crate::errors::*;

#[derive(Debug)]
struct Grabbed {
    body: Rc<Body>,
    link_index: usize,
    /// placement of the grabbed body in the frame of the grabbing link
    relative: Isometry3<f64>,
}

/// Kinematic tree with a base placement
///
/// A `Body` is the backing model of the configurations. It owns a
/// `Chain<f64>`, its placement in the world (the base transform), the bodies
/// it is grabbing, and the single active DOF selection used by
/// `ActiveJointConfiguration`.
///
/// All the methods take `&self`, the state is kept in `RefCell` like `Node`.
///
/// # Examples
///
/// ```
/// use cspace::*;
///
/// let j0 = JointBuilder::new()
///     .name("pan")
///     .joint_type(JointType::Rotational { axis: Vector3::z_axis() })
///     .into_node();
/// let j1 = JointBuilder::new()
///     .name("slide")
///     .translation(Translation3::new(0.0, 0.0, 0.5))
///     .joint_type(JointType::Linear { axis: Vector3::x_axis() })
///     .into_node();
/// connect![j0 => j1];
///
/// let env = Environment::new();
/// let body = env.add_body(Body::new("robot", Chain::from_root(j0)));
/// assert_eq!(body.dof(), 2);
/// body.set_transform(Isometry3::translation(1.0, 0.0, 0.0));
/// body.chain().set_joint_positions(&[0.0, 0.2]).unwrap();
/// let transforms = body.link_transforms();
/// assert!((transforms[1].translation.vector.x - 1.2).abs() < 1e-10);
/// ```
#[derive(Debug)]
pub struct Body {
    name: String,
    chain: Chain<f64>,
    transform: RefCell<Isometry3<f64>>,
    grabbed: RefCell<Vec<Grabbed>>,
    pub(crate) active_dofs: RefCell<ActiveDofs>,
    env: RefCell<Weak<RefCell<EnvironmentImpl>>>,
}

impl Body {
    pub fn new(name: &str, chain: Chain<f64>) -> Self {
        Self {
            name: name.to_owned(),
            chain,
            transform: RefCell::new(Isometry3::identity()),
            grabbed: RefCell::new(Vec::new()),
            active_dofs: RefCell::new(ActiveDofs::default()),
            env: RefCell::new(Weak::new()),
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn chain(&self) -> &Chain<f64> {
        &self.chain
    }
    /// Number of movable joints
    pub fn dof(&self) -> usize {
        self.chain.dof()
    }
    pub fn num_links(&self) -> usize {
        self.chain.len()
    }
    /// The environment which owns this body
    pub fn env(&self) -> Result<Environment, Error> {
        Environment::upgrade(&self.env.borrow()).ok_or_else(|| Error::EnvironmentDroppedError {
            body_name: self.name.clone(),
        })
    }
    pub(crate) fn set_env(&self, env: Weak<RefCell<EnvironmentImpl>>) {
        self.env.replace(env);
    }

    /// Placement of the root of the chain in the world
    pub fn transform(&self) -> Isometry3<f64> {
        *self.transform.borrow()
    }
    /// Move the body, grabbed bodies follow
    pub fn set_transform(&self, transform: Isometry3<f64>) {
        self.transform.replace(transform);
        self.update_grabbed();
    }

    /// World transforms of all links, in link index order
    pub fn link_transforms(&self) -> Vec<Isometry3<f64>> {
        let base = self.transform();
        self.chain
            .update_transforms()
            .into_iter()
            .map(|trans| base * trans)
            .collect()
    }
    pub fn link_transform(&self, link_index: usize) -> Result<Isometry3<f64>, Error> {
        self.check_link_index(link_index)?;
        Ok(self.link_transforms()[link_index])
    }

    pub(crate) fn check_link_index(&self, link_index: usize) -> Result<(), Error> {
        if link_index >= self.num_links() {
            return Err(Error::LinkIndexError {
                index: link_index,
                body_name: self.name.clone(),
                num_links: self.num_links(),
            });
        }
        Ok(())
    }

    /// Fails if an index is out of range or appears twice
    pub(crate) fn check_joint_indices(&self, joint_indices: &[usize]) -> Result<(), Error> {
        for (i, &index) in joint_indices.iter().enumerate() {
            if index >= self.dof() {
                return Err(Error::InvalidJointIndexError {
                    index,
                    body_name: self.name.clone(),
                    dof: self.dof(),
                });
            }
            if joint_indices[..i].contains(&index) {
                return Err(Error::DuplicateJointIndexError { index });
            }
        }
        Ok(())
    }

    /// Attach `body` to the link, it moves with the link from now on
    ///
    /// Grabbing itself or a body which already holds this one is refused.
    ///
    /// # Examples
    ///
    /// ```
    /// use cspace::*;
    ///
    /// let arm = JointBuilder::new()
    ///     .name("slide")
    ///     .joint_type(JointType::Linear { axis: Vector3::x_axis() })
    ///     .into_node();
    /// let env = Environment::new();
    /// let robot = env.add_body(Body::new("robot", Chain::from_root(arm)));
    /// let cup = env.add_body(Body::new("cup", Chain::from_root(JointBuilder::new().into_node())));
    /// cup.set_transform(Isometry3::translation(0.0, 0.0, 0.3));
    /// robot.grab(&cup, 0).unwrap();
    /// BodyConfiguration::new(robot.clone()).set_dof_values(&[0.5]).unwrap();
    /// assert_eq!(cup.transform().translation.vector, Vector3::new(0.5, 0.0, 0.3));
    /// ```
    pub fn grab(&self, body: &Rc<Body>, link_index: usize) -> Result<(), Error> {
        self.check_link_index(link_index)?;
        if std::ptr::eq(self, Rc::as_ptr(body)) {
            warn!("body {} cannot grab itself", self.name);
            return Ok(());
        }
        if body.is_holding(self) {
            warn!("body {} already holds {}, grab refused", body.name, self.name);
            return Ok(());
        }
        let link_transform = self.link_transforms()[link_index];
        let relative = link_transform.inverse() * body.transform();
        let mut grabbed = self.grabbed.borrow_mut();
        grabbed.retain(|g| !Rc::ptr_eq(&g.body, body));
        grabbed.push(Grabbed {
            body: body.clone(),
            link_index,
            relative,
        });
        Ok(())
    }
    /// Detach the grabbed body, returns `false` if it was not grabbed
    pub fn release(&self, body: &Rc<Body>) -> bool {
        let mut grabbed = self.grabbed.borrow_mut();
        let num = grabbed.len();
        grabbed.retain(|g| !Rc::ptr_eq(&g.body, body));
        num != grabbed.len()
    }
    /// Grabbed bodies with the index of the grabbing link
    pub fn grabbed_bodies(&self) -> Vec<(Rc<Body>, usize)> {
        self.grabbed
            .borrow()
            .iter()
            .map(|g| (g.body.clone(), g.link_index))
            .collect()
    }
    /// `true` if `body` is grabbed by this body, directly or through other grabbed bodies
    fn is_holding(&self, body: &Body) -> bool {
        self.grabbed
            .borrow()
            .iter()
            .any(|g| std::ptr::eq(Rc::as_ptr(&g.body), body) || g.body.is_holding(body))
    }
    /// Move the grabbed bodies to follow their links
    pub(crate) fn update_grabbed(&self) {
        if self.grabbed.borrow().is_empty() {
            return;
        }
        let transforms = self.link_transforms();
        for g in self.grabbed.borrow().iter() {
            g.body.set_transform(transforms[g.link_index] * g.relative);
        }
    }

    /// Values of the joints followed by the affine values
    pub(crate) fn dof_values_for(&self, joint_indices: &[usize], affine: &AffineOverlay) -> Vec<f64> {
        let mut values = joint_indices
            .iter()
            .filter_map(|&index| self.chain.joint_position(index))
            .collect::<Vec<_>>();
        values.extend(affine.values_from_transform(&self.transform()));
        values
    }

    /// Set the joints and the affine placement, without limit check
    pub(crate) fn set_dof_values_for(
        &self,
        joint_indices: &[usize],
        affine: &AffineOverlay,
        values: &[f64],
    ) -> Result<(), Error> {
        let required = joint_indices.len() + affine.dof_count();
        if values.len() != required {
            return Err(Error::SizeMismatchError {
                input: values.len(),
                required,
            });
        }
        let (joint_values, affine_values) = values.split_at(joint_indices.len());
        for (&index, &value) in joint_indices.iter().zip(joint_values.iter()) {
            if let Some(node) = self.chain.joint_node(index) {
                if let Some(ref range) = node.joint().limits {
                    if !range.is_valid(value) {
                        trace!(
                            joint = %node.joint().name,
                            value,
                            "position is out of the limits, set without clamping"
                        );
                    }
                }
            }
            self.chain.set_joint_position_unchecked(index, value);
        }
        if affine.is_empty() {
            self.update_grabbed();
        } else {
            let mut transform = self.transform();
            affine.apply_to_transform(&mut transform, affine_values);
            self.set_transform(transform);
        }
        Ok(())
    }

    /// Limits of the joints followed by the (unbounded) affine limits
    pub(crate) fn dof_limits_for(
        &self,
        joint_indices: &[usize],
        affine: &AffineOverlay,
    ) -> (Vec<f64>, Vec<f64>) {
        let (mut lower, mut upper): (Vec<f64>, Vec<f64>) = joint_indices
            .iter()
            .map(|&index| {
                match self.chain.joint_node(index).and_then(|node| node.joint().limits) {
                    Some(range) => (range.min, range.max),
                    None => (f64::NEG_INFINITY, f64::INFINITY),
                }
            })
            .unzip();
        let (affine_lower, affine_upper) = affine.limits();
        lower.extend(affine_lower);
        upper.extend(affine_upper);
        (lower, upper)
    }

    /// `true` if the link of this body moves with at least one of the DOFs
    pub(crate) fn affects_own_link(
        &self,
        joint_indices: &[usize],
        affine: &AffineOverlay,
        link_index: usize,
    ) -> bool {
        if link_index >= self.num_links() {
            return false;
        }
        if !affine.is_empty() {
            return true;
        }
        joint_indices.iter().any(|&index| {
            self.chain
                .joint_link_index(index)
                .map_or(false, |joint_link| {
                    self.chain.is_ancestor_or_self(joint_link, link_index)
                })
        })
    }

    /// Index of the closest DOF upstream of the link
    ///
    /// The first affine DOF is used if no listed joint moves the link.
    pub(crate) fn implicated_dof(
        &self,
        joint_indices: &[usize],
        affine: &AffineOverlay,
        link_index: usize,
    ) -> Option<usize> {
        self.chain
            .iter_ancestor_indices(link_index)
            .find_map(|ancestor| {
                joint_indices
                    .iter()
                    .position(|&index| self.chain.joint_link_index(index) == Some(ancestor))
            })
            .or_else(|| {
                if affine.is_empty() || link_index >= self.num_links() {
                    None
                } else {
                    Some(joint_indices.len())
                }
            })
    }

    pub(crate) fn does_affect_link(
        self: &Rc<Self>,
        joint_indices: &[usize],
        affine: &AffineOverlay,
        link: &LinkRef,
    ) -> bool {
        if Rc::ptr_eq(self, link.body()) {
            return self.affects_own_link(joint_indices, affine, link.index());
        }
        self.grabbed.borrow().iter().any(|g| {
            Rc::ptr_eq(&g.body, link.body())
                && self.affects_own_link(joint_indices, affine, g.link_index)
        })
    }

    /// Links moved by the DOFs, then the links of the grabbed bodies
    pub(crate) fn affected_links_for(
        self: &Rc<Self>,
        joint_indices: &[usize],
        affine: &AffineOverlay,
        only_with_geometry: bool,
    ) -> Vec<AffectedLink> {
        let mut affected = Vec::new();
        for (index, node) in self.chain.iter().enumerate() {
            if only_with_geometry && !node.has_geometry() {
                continue;
            }
            if !self.affects_own_link(joint_indices, affine, index) {
                continue;
            }
            if let Some(dof_index) = self.implicated_dof(joint_indices, affine, index) {
                affected.push(AffectedLink {
                    link: LinkRef {
                        body: self.clone(),
                        index,
                    },
                    jacobian_link_index: index,
                    dof_index,
                });
            }
        }
        for g in self.grabbed.borrow().iter() {
            if !self.affects_own_link(joint_indices, affine, g.link_index) {
                continue;
            }
            let dof_index = match self.implicated_dof(joint_indices, affine, g.link_index) {
                Some(dof_index) => dof_index,
                None => continue,
            };
            for (index, node) in g.body.chain().iter().enumerate() {
                if only_with_geometry && !node.has_geometry() {
                    continue;
                }
                affected.push(AffectedLink {
                    link: LinkRef {
                        body: g.body.clone(),
                        index,
                    },
                    jacobian_link_index: g.link_index,
                    dof_index,
                });
            }
        }
        affected
    }

    /// This body followed by the grabbed bodies
    pub fn bodies(self: &Rc<Self>) -> Vec<Rc<Body>> {
        let mut bodies = vec![self.clone()];
        for (body, _) in self.grabbed_bodies() {
            if !bodies.iter().any(|b| Rc::ptr_eq(b, &body)) {
                bodies.push(body);
            }
        }
        bodies
    }

    /// Handles of all the links
    pub fn links(self: &Rc<Self>) -> Vec<LinkRef> {
        (0..self.num_links())
            .map(|index| LinkRef {
                body: self.clone(),
                index,
            })
            .collect()
    }

    /// Snapshot of the whole state, restored when the returned value is dropped
    ///
    /// # Examples
    ///
    /// ```
    /// use cspace::*;
    ///
    /// let node = JointBuilder::new()
    ///     .joint_type(JointType::Rotational { axis: Vector3::z_axis() })
    ///     .into_node();
    /// let body = std::rc::Rc::new(Body::new("b", Chain::from_root(node)));
    /// {
    ///     let _saver = body.state_saver();
    ///     body.chain().set_joint_positions(&[1.0]).unwrap();
    ///     body.set_transform(Isometry3::translation(0.0, 1.0, 0.0));
    /// }
    /// assert_eq!(body.chain().joint_positions(), vec![0.0]);
    /// assert_eq!(body.transform(), Isometry3::identity());
    /// ```
    pub fn state_saver(self: &Rc<Self>) -> BodyStateSaver {
        BodyStateSaver {
            body: self.clone(),
            transform: self.transform(),
            joint_positions: self.chain.joint_positions(),
        }
    }
}

/// Handle of a link: a body and the link index in the body
#[derive(Clone)]
pub struct LinkRef {
    body: Rc<Body>,
    index: usize,
}

impl LinkRef {
    pub fn new(body: &Rc<Body>, index: usize) -> Result<Self, Error> {
        body.check_link_index(index)?;
        Ok(Self {
            body: body.clone(),
            index,
        })
    }
    /// Find the link by name
    pub fn find(body: &Rc<Body>, link_name: &str) -> Option<Self> {
        body.chain().link_index(link_name).map(|index| Self {
            body: body.clone(),
            index,
        })
    }
    pub fn body(&self) -> &Rc<Body> {
        &self.body
    }
    pub fn index(&self) -> usize {
        self.index
    }
    pub fn name(&self) -> String {
        self.body
            .chain()
            .node(self.index)
            .map(|node| node.link_name())
            .unwrap_or_default()
    }
    pub fn has_geometry(&self) -> bool {
        self.body
            .chain()
            .node(self.index)
            .map_or(false, |node| node.has_geometry())
    }
    pub fn world_transform(&self) -> Isometry3<f64> {
        self.body.link_transforms()[self.index]
    }
}

impl PartialEq for LinkRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.body, &other.body) && self.index == other.index
    }
}

impl fmt::Debug for LinkRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LinkRef")
            .field("body", &self.body.name())
            .field("index", &self.index)
            .field("name", &self.name())
            .finish()
    }
}

/// A link moved by a configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AffectedLink {
    pub link: LinkRef,
    /// Link of the configuration's body to use for jacobians of points on
    /// `link`. It differs from `link` for links of grabbed bodies.
    pub jacobian_link_index: usize,
    /// Closest DOF of the configuration which moves the link
    pub dof_index: usize,
}

/// Native snapshot of a body: placement and all the joint positions
///
/// It covers more than the DOF vector of a configuration which uses only a
/// part of the joints or of the affine DOFs.
#[derive(Debug)]
pub struct BodyStateSaver {
    body: Rc<Body>,
    transform: Isometry3<f64>,
    joint_positions: Vec<f64>,
}

impl Saver for BodyStateSaver {
    fn scope(&self) -> SaverScope {
        SaverScope::BodyState
    }
}

impl Drop for BodyStateSaver {
    fn drop(&mut self) {
        self.body
            .chain()
            .set_joint_positions_unchecked(&self.joint_positions);
        self.body.set_transform(self.transform);
        trace!(body = %self.body.name(), "restored body state");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affine::AffineDofs;
    use crate::joint::JointType;
    use crate::node::JointBuilder;
    use na::{Translation3, Vector3};

    fn create_body() -> Rc<Body> {
        let j0 = JointBuilder::new()
            .name("j0")
            .joint_type(JointType::Rotational {
                axis: Vector3::z_axis(),
            })
            .limits(Some((-1.0..=1.0).into()))
            .into_node();
        let j1 = JointBuilder::new()
            .name("j1")
            .translation(Translation3::new(1.0, 0.0, 0.0))
            .joint_type(JointType::Rotational {
                axis: Vector3::z_axis(),
            })
            .into_node();
        let j2 = JointBuilder::new()
            .name("j2")
            .translation(Translation3::new(0.0, 1.0, 0.0))
            .joint_type(JointType::Linear {
                axis: Vector3::z_axis(),
            })
            .into_node();
        j1.set_parent(&j0);
        j2.set_parent(&j0);
        Rc::new(Body::new("body", Chain::from_root(j0)))
    }

    #[test]
    fn test_check_joint_indices() {
        let body = create_body();
        assert!(body.check_joint_indices(&[2, 0, 1]).is_ok());
        assert!(matches!(
            body.check_joint_indices(&[0, 3]),
            Err(Error::InvalidJointIndexError { index: 3, .. })
        ));
        assert!(matches!(
            body.check_joint_indices(&[1, 0, 1]),
            Err(Error::DuplicateJointIndexError { index: 1 })
        ));
    }

    #[test]
    fn test_dof_values_for_subset() {
        let body = create_body();
        let affine = AffineOverlay::default();
        body.set_dof_values_for(&[2, 0], &affine, &[0.3, 5.0]).unwrap();
        // out of limits, but passed through
        assert_eq!(body.chain().joint_positions(), vec![5.0, 0.0, 0.3]);
        assert_eq!(body.dof_values_for(&[2, 0], &affine), vec![0.3, 5.0]);
        assert!(matches!(
            body.set_dof_values_for(&[2, 0], &affine, &[0.3]),
            Err(Error::SizeMismatchError {
                input: 1,
                required: 2
            })
        ));
        let (lower, upper) = body.dof_limits_for(&[0, 1], &affine);
        assert_eq!(lower, vec![-1.0, f64::NEG_INFINITY]);
        assert_eq!(upper, vec![1.0, f64::INFINITY]);
    }

    #[test]
    fn test_affected_links() {
        let body = create_body();
        let none = AffineOverlay::default();
        assert!(!body.affects_own_link(&[1], &none, 0));
        assert!(body.affects_own_link(&[1], &none, 1));
        assert!(!body.affects_own_link(&[1], &none, 2));
        assert!(body.affects_own_link(&[0], &none, 2));
        assert_eq!(body.implicated_dof(&[2, 0], &none, 2), Some(0));
        assert_eq!(body.implicated_dof(&[2, 0], &none, 1), Some(1));
        assert_eq!(body.implicated_dof(&[2], &none, 1), None);

        let translation = AffineOverlay::new(AffineDofs::TRANSLATION, Vector3::z_axis()).unwrap();
        assert!(body.affects_own_link(&[], &translation, 0));
        assert_eq!(body.implicated_dof(&[2], &translation, 1), Some(1));
        let links = body.affected_links_for(&[2], &translation, false);
        assert_eq!(links.len(), 3);
    }

    #[test]
    fn test_grabbed_body_follows() {
        let body = create_body();
        let box_node = JointBuilder::new().name("box").into_node();
        let grabbed = Rc::new(Body::new("box", Chain::from_root(box_node)));
        grabbed.set_transform(Isometry3::translation(1.0, 0.0, 0.5));
        body.grab(&grabbed, 1).unwrap();
        assert_eq!(body.bodies().len(), 2);

        let none = AffineOverlay::default();
        body.set_dof_values_for(&[0], &none, &[std::f64::consts::FRAC_PI_2])
            .unwrap();
        let trans = grabbed.transform().translation.vector;
        assert!((trans - Vector3::new(0.0, 1.0, 0.5)).norm() < 1e-10);

        let link = LinkRef::new(&grabbed, 0).unwrap();
        assert!(body.does_affect_link(&[0], &none, &link));
        assert!(!body.does_affect_link(&[2], &none, &link));
        let affected = body.affected_links_for(&[0], &none, false);
        let grabbed_link = affected.iter().find(|a| a.link == link).unwrap();
        assert_eq!(grabbed_link.jacobian_link_index, 1);
        assert_eq!(grabbed_link.dof_index, 0);

        assert!(body.release(&grabbed));
        assert!(!body.release(&grabbed));
        assert_eq!(body.bodies().len(), 1);
    }

    #[test]
    fn test_grab_refuses_cycles() {
        let a = create_body();
        let b = create_body();
        let c = create_body();
        a.grab(&b, 0).unwrap();
        b.grab(&c, 0).unwrap();
        c.grab(&a, 0).unwrap();
        b.grab(&a, 1).unwrap();
        a.grab(&a, 0).unwrap();
        assert!(c.grabbed_bodies().is_empty());
        assert_eq!(b.grabbed_bodies().len(), 1);
        assert_eq!(a.grabbed_bodies().len(), 1);

        // no recursion back into a
        a.set_dof_values_for(&[0], &AffineOverlay::default(), &[0.1])
            .unwrap();
        assert_eq!(Rc::strong_count(&a), 1);
    }

    #[test]
    fn test_state_saver_restores_all_joints() {
        let body = create_body();
        body.chain().set_joint_positions(&[0.1, 0.2, 0.3]).unwrap();
        {
            let saver = body.state_saver();
            assert_eq!(saver.scope(), SaverScope::BodyState);
            body.set_dof_values_for(&[1], &AffineOverlay::default(), &[1.5])
                .unwrap();
            body.chain().set_joint_position_unchecked(2, -1.0);
            body.set_transform(Isometry3::translation(0.0, 0.0, 3.0));
        }
        assert_eq!(body.chain().joint_positions(), vec![0.1, 0.2, 0.3]);
        assert_eq!(body.transform(), Isometry3::identity());
    }
}
