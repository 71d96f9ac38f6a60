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
//! graph structure for kinematic chain
use na::{Isometry3, RealField, Translation3, UnitQuaternion};
use nalgebra as na;
use simba::scalar::SubsetOf;
use std::cell::{Ref, RefCell};
use std::fmt::{self, Display};
use std::ops::Deref;
use std::rc::{Rc, Weak};

use crate::errors::*;
use crate::iterator::*;
use crate::joint::*;
use crate::link::*;

type WeakNode<T> = Weak<RefCell<NodeImpl<T>>>;

#[derive(Debug)]
/// Node for joint tree struct
pub struct NodeImpl<T>
where
    T: RealField,
{
    pub parent: Option<WeakNode<T>>,
    pub children: Vec<Node<T>>,
    pub joint: Joint<T>,
    pub link: Option<Link<T>>,
}

/// Parts of `Chain`
///
/// It contains joint, joint (transform), the link moved by the joint and parent/children.
#[derive(Debug)]
pub struct Node<T: RealField>(pub(crate) Rc<RefCell<NodeImpl<T>>>);

impl<T> Node<T>
where
    T: RealField + SubsetOf<f64>,
{
    pub(crate) fn from_rc(rc: Rc<RefCell<NodeImpl<T>>>) -> Self {
        Node(rc)
    }

    pub fn new(joint: Joint<T>) -> Self {
        Node::<T>(Rc::new(RefCell::new(NodeImpl {
            parent: None,
            children: Vec::new(),
            joint,
            link: None,
        })))
    }

    pub fn joint(&self) -> JointRefGuard<'_, T> {
        JointRefGuard {
            guard: self.0.borrow(),
        }
    }

    pub fn joint_position(&self) -> Option<T> {
        self.0.borrow().joint.joint_position()
    }

    pub fn parent(&self) -> Option<Node<T>> {
        match self.0.borrow().parent {
            Some(ref weak) => weak.upgrade().map(Node::from_rc),
            None => None,
        }
    }

    pub fn children(&self) -> ChildrenRefGuard<'_, T> {
        ChildrenRefGuard {
            guard: self.0.borrow(),
        }
    }

    /// iter from the end to root, it contains nodes[id] itself
    #[inline]
    pub fn iter_ancestors(&self) -> Ancestors<T> {
        Ancestors::new(Some(self.clone()))
    }
    /// iter to the end, it contains nodes[id] itself
    #[inline]
    pub fn iter_descendants(&self) -> Descendants<T> {
        Descendants::new(vec![self.clone()])
    }

    /// Set parent and child relations at same time
    pub fn set_parent(&self, parent: &Node<T>) {
        self.0.borrow_mut().parent = Some(Rc::downgrade(&parent.0));
        parent.0.borrow_mut().children.push(self.clone());
    }

    /// # Examples
    ///
    /// ```
    /// let l0 = cspace::JointBuilder::<f32>::new().into_node();
    /// let l1 = cspace::JointBuilder::new().into_node();
    /// l1.set_parent(&l0);
    /// assert!(l0.is_root());
    /// assert!(!l1.is_root());
    /// ```
    pub fn is_root(&self) -> bool {
        self.0.borrow().parent.is_none()
    }

    /// # Examples
    ///
    /// ```
    /// let l0 = cspace::JointBuilder::<f64>::new().into_node();
    /// let l1 = cspace::JointBuilder::new().into_node();
    /// l1.set_parent(&l0);
    /// assert!(!l0.is_end());
    /// assert!(l1.is_end());
    /// ```
    pub fn is_end(&self) -> bool {
        self.0.borrow().children.is_empty()
    }

    /// Set the origin transform of the joint
    #[inline]
    pub fn set_origin(&self, trans: Isometry3<T>) {
        self.0.borrow_mut().joint.set_origin(trans);
    }

    /// Set the position (angle) of the joint
    ///
    /// If position is out of limit, it returns Err.
    ///
    /// # Examples
    ///
    /// ```
    /// use cspace::*;
    /// let l0 = JointBuilder::new()
    ///     .joint_type(JointType::Linear{axis: Vector3::z_axis()})
    ///     .limits(Some((0.0..=2.0).into()))
    ///     .into_node();
    /// assert!(l0.set_joint_position(1.0).is_ok());
    /// assert!(l0.set_joint_position(-1.0).is_err());
    /// ```
    ///
    /// Setting position for Fixed joint is error.
    ///
    /// ```
    /// use cspace::*;
    /// let l0 = JointBuilder::<f64>::new()
    ///     .joint_type(JointType::Fixed)
    ///     .into_node();
    /// assert!(l0.set_joint_position(0.0).is_err());
    /// ```
    pub fn set_joint_position(&self, position: T) -> Result<(), Error> {
        self.0.borrow_mut().joint.set_joint_position(position)
    }

    #[inline]
    pub fn set_joint_position_unchecked(&self, position: T) {
        self.0
            .borrow_mut()
            .joint
            .set_joint_position_unchecked(position);
    }

    /// Transform of this node relative to the parent node
    #[inline]
    pub fn local_transform(&self) -> Isometry3<T> {
        self.0.borrow().joint.local_transform()
    }

    /// Get the calculated transform relative to the root of the chain.
    /// Call `Chain::update_transforms()` before using this method.
    ///
    ///  # Examples
    ///
    /// ```
    /// use cspace::*;
    ///
    /// let l0 = JointBuilder::new()
    ///     .translation(Translation3::new(0.0, 0.0, 0.2))
    ///     .joint_type(JointType::Rotational{axis: Vector3::y_axis()})
    ///     .into_node();
    /// let l1 = JointBuilder::new()
    ///     .translation(Translation3::new(0.0, 0.0, 1.0))
    ///     .joint_type(JointType::Linear{axis: Vector3::z_axis()})
    ///     .into_node();
    /// l1.set_parent(&l0);
    /// let tree = Chain::<f64>::from_root(l0);
    /// tree.set_joint_positions(&[3.141592 * 0.5, 0.1]).unwrap();
    /// assert!(l1.world_transform().is_none());
    /// let _poses = tree.update_transforms();
    /// assert!((l1.world_transform().unwrap().translation.vector.x - 1.1).abs() < 0.0001);
    /// assert!((l1.world_transform().unwrap().translation.vector.z - 0.2).abs() < 0.0001);
    /// ```
    #[inline]
    pub fn world_transform(&self) -> Option<Isometry3<T>> {
        self.0.borrow().joint.world_transform()
    }

    pub fn set_link(&self, link: Option<Link<T>>) {
        self.0.borrow_mut().link = link;
    }

    pub fn link(&self) -> OptionLinkRefGuard<'_, T> {
        OptionLinkRefGuard {
            guard: self.0.borrow(),
        }
    }

    /// Name of the link, or the name of the joint if no link is attached
    pub fn link_name(&self) -> String {
        let inner = self.0.borrow();
        match inner.link {
            Some(ref link) => link.name.to_owned(),
            None => inner.joint.name.to_owned(),
        }
    }

    /// `true` if the attached link has collision geometry
    pub fn has_geometry(&self) -> bool {
        self.0
            .borrow()
            .link
            .as_ref()
            .map_or(false, |link| link.has_geometry())
    }
}

impl<T> ::std::clone::Clone for Node<T>
where
    T: RealField,
{
    fn clone(&self) -> Self {
        Node::<T>(self.0.clone())
    }
}

impl<T> PartialEq for Node<T>
where
    T: RealField,
{
    fn eq(&self, other: &Node<T>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: RealField> Display for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let inner = self.0.borrow();
        inner.joint.fmt(f)?;

        if let Some(l) = &inner.link {
            write!(f, " => /{}/", l.name)?;
        }
        Ok(())
    }
}

impl<T> From<Joint<T>> for Node<T>
where
    T: RealField + SubsetOf<f64>,
{
    fn from(joint: Joint<T>) -> Self {
        Self::new(joint)
    }
}

macro_rules! def_ref_guard {
    ($guard_struct:ident, $target:ty, $member:ident) => {
        pub struct $guard_struct<'a, T>
        where
            T: RealField,
        {
            guard: Ref<'a, NodeImpl<T>>,
        }

        impl<'a, T> Deref for $guard_struct<'a, T>
        where
            T: RealField,
        {
            type Target = $target;
            fn deref(&self) -> &Self::Target {
                &self.guard.$member
            }
        }
    };
}

def_ref_guard!(JointRefGuard, Joint<T>, joint);
def_ref_guard!(OptionLinkRefGuard, Option<Link<T>>, link);
def_ref_guard!(ChildrenRefGuard, Vec<Node<T>>, children);

/// Build a `Joint<T>`
///
/// # Examples
///
/// ```
/// use cspace::*;
/// let l0 = JointBuilder::<f64>::new()
///     .name("link_pitch")
///     .translation(Translation3::new(0.0, 0.1, 0.0))
///     .joint_type( JointType::Rotational{axis: Vector3::y_axis()})
///     .finalize();
/// println!("{:?}", l0);
/// ```
#[derive(Debug, Clone)]
pub struct JointBuilder<T: RealField> {
    name: String,
    joint_type: JointType<T>,
    limits: Option<Range<T>>,
    origin: Isometry3<T>,
    link: Option<Link<T>>,
}

impl<T> Default for JointBuilder<T>
where
    T: RealField + SubsetOf<f64>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> JointBuilder<T>
where
    T: RealField + SubsetOf<f64>,
{
    pub fn new() -> JointBuilder<T> {
        JointBuilder {
            name: "".to_string(),
            joint_type: JointType::Fixed,
            limits: None,
            origin: Isometry3::identity(),
            link: None,
        }
    }
    /// Set the name of the `Joint`
    pub fn name(mut self, name: &str) -> JointBuilder<T> {
        self.name = name.to_string();
        self
    }
    /// Set the joint type
    pub fn joint_type(mut self, joint_type: JointType<T>) -> JointBuilder<T> {
        self.joint_type = joint_type;
        self
    }
    /// Set joint limits
    pub fn limits(mut self, limits: Option<Range<T>>) -> JointBuilder<T> {
        self.limits = limits;
        self
    }
    /// Set the origin transform of this joint
    pub fn origin(mut self, origin: Isometry3<T>) -> JointBuilder<T> {
        self.origin = origin;
        self
    }
    /// Set the translation of the origin transform of this joint
    pub fn translation(mut self, translation: Translation3<T>) -> JointBuilder<T> {
        self.origin.translation = translation;
        self
    }
    /// Set the rotation of the origin transform of this joint
    pub fn rotation(mut self, rotation: UnitQuaternion<T>) -> JointBuilder<T> {
        self.origin.rotation = rotation;
        self
    }
    /// Set the link moved by this joint, only used by `into_node`
    pub fn link(mut self, link: Link<T>) -> JointBuilder<T> {
        self.link = Some(link);
        self
    }
    /// Create `Joint` instance
    pub fn finalize(self) -> Joint<T> {
        let mut joint = Joint::new(&self.name, self.joint_type);
        joint.set_origin(self.origin);
        joint.limits = self.limits;
        joint
    }
    /// Create `Node` instead of `Joint` as output
    pub fn into_node(mut self) -> Node<T> {
        let link = self.link.take();
        let node: Node<T> = self.finalize().into();
        node.set_link(link);
        node
    }
}

/// set parents easily
///
/// ```
/// # fn main() {
/// let l0 = cspace::JointBuilder::<f64>::new().into_node();
/// let l1 = cspace::JointBuilder::new().into_node();
/// let l2 = cspace::JointBuilder::new().into_node();
///
/// // This is the same as below
/// // l1.set_parent(&l0);
/// // l2.set_parent(&l1);
/// cspace::connect![l0 => l1 => l2];
///
/// assert!(l0.is_root());
/// assert!(!l1.is_root());
/// assert!(!l1.is_end());
/// assert!(l2.is_end());
/// # }
/// ```
#[macro_export]
macro_rules! connect {
    ($x:expr => $y:expr) => {
        $y.set_parent(&$x);
    };
    ($x:expr => $y:expr => $($rest:tt)+) => {
        $y.set_parent(&$x);
        $crate::connect!($y => $($rest)*);
    };
}
