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
use na::{Isometry3, RealField};
use nalgebra as na;
use simba::scalar::SubsetOf;
use std::fmt::{self, Display};

use crate::errors::*;
use crate::joint::*;
use crate::node::*;

/// Kinematic Chain using `Node`
///
/// Every node is a "link slot": the link attached to a node is moved by the
/// joint of the node. Nodes are indexed by their position in `iter()` (link
/// index), movable joints by their position in `iter_joints()` (joint index).
///
/// # Examples
///
/// ```
/// use cspace::*;
///
/// let l0 = JointBuilder::new()
///     .name("joint_pitch0")
///     .translation(Translation3::new(0.0, 0.0, 0.1))
///     .joint_type(JointType::Rotational{axis: Vector3::y_axis()})
///     .into_node();
/// let l1 = JointBuilder::new()
///     .name("joint_pitch1")
///     .translation(Translation3::new(0.0, 0.0, 0.5))
///     .joint_type(JointType::Rotational{axis: Vector3::y_axis()})
///     .into_node();
/// let l2 = JointBuilder::new()
///     .name("hand")
///     .translation(Translation3::new(0.0, 0.0, 0.5))
///     .joint_type(JointType::Fixed)
///     .into_node();
///
/// // Sequencial joints structure
/// connect![l0 => l1 => l2];
///
/// let tree = Chain::<f64>::from_root(l0);
/// assert_eq!(tree.dof(), 2);
///
/// // Get joint positions
/// let positions = tree.joint_positions();
/// assert_eq!(positions.len(), 2);
/// assert_eq!(positions[0], 0.0);
/// assert_eq!(positions[1], 0.0);
///
/// // Get the initial joint transforms
/// let transforms = tree.update_transforms();
/// assert_eq!(transforms.len(), 3);
/// assert_eq!(transforms[0].translation.vector.z, 0.1);
/// assert_eq!(transforms[1].translation.vector.z, 0.6);
/// assert_eq!(transforms[2].translation.vector.z, 1.1);
///
/// // Set joint positions
/// tree.set_joint_positions(&[1.0, 2.0]).unwrap();
/// let positions = tree.joint_positions();
/// assert_eq!(positions[0], 1.0);
/// assert_eq!(positions[1], 2.0);
/// ```
#[derive(Debug)]
pub struct Chain<T: RealField> {
    nodes: Vec<Node<T>>,
    /// index of the parent node in `nodes`, parents always come first
    parents: Vec<Option<usize>>,
    /// index in `nodes` of each movable joint
    movable_nodes: Vec<usize>,
}

impl<T> Chain<T>
where
    T: RealField + SubsetOf<f64>,
{
    fn fmt_with_indent_level(
        &self,
        node: &Node<T>,
        level: usize,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        if self.nodes.iter().any(|n| n == node) {
            writeln!(f, "{}{}", "    ".repeat(level), node)?;
        }
        for c in node.children().iter() {
            self.fmt_with_indent_level(c, level + 1, f)?
        }
        Ok(())
    }
}

impl<T> Display for Chain<T>
where
    T: RealField + SubsetOf<f64>,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.nodes.first() {
            Some(root) => self.fmt_with_indent_level(root, 0, f),
            None => Ok(()),
        }
    }
}

impl<T> Chain<T>
where
    T: RealField + SubsetOf<f64>,
{
    /// Create Chain from root joint
    ///
    /// # Examples
    ///
    /// ```
    /// use cspace::*;
    ///
    /// let l0 = JointBuilder::<f64>::new().into_node();
    /// let l1 = JointBuilder::new().into_node();
    /// l1.set_parent(&l0);
    /// let tree = Chain::from_root(l0);
    /// assert_eq!(tree.iter().count(), 2);
    /// ```
    pub fn from_root(root_joint: Node<T>) -> Self {
        let nodes = root_joint.iter_descendants().collect::<Vec<_>>();
        let parents = nodes
            .iter()
            .map(|node| {
                node.parent()
                    .and_then(|parent| nodes.iter().position(|n| *n == parent))
            })
            .collect();
        let movable_nodes = nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.joint().is_movable())
            .map(|(i, _)| i)
            .collect();
        Chain {
            nodes,
            parents,
            movable_nodes,
        }
    }
    /// Iterate for all joint nodes
    ///
    /// The order is from parent to children. You can assume that parent is already iterated.
    ///
    /// # Examples
    ///
    /// ```
    /// use cspace::*;
    ///
    /// let l0 = Node::new(Joint::new("fixed0", JointType::Fixed));
    /// let l1 = Node::new(Joint::new("fixed1", JointType::Fixed));
    /// l1.set_parent(&l0);
    /// let tree = Chain::<f64>::from_root(l0);
    /// let names = tree.iter().map(|node| node.joint().name.clone()).collect::<Vec<_>>();
    /// assert_eq!(names.len(), 2);
    /// assert_eq!(names[0], "fixed0");
    /// assert_eq!(names[1], "fixed1");
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = &Node<T>> {
        self.nodes.iter()
    }
    /// Iterate for movable joints, in joint index order
    pub fn iter_joints(&self) -> impl Iterator<Item = JointRefGuard<'_, T>> {
        self.movable_nodes.iter().map(move |&i| self.nodes[i].joint())
    }
    /// Number of nodes (links)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    /// Get the node by link index
    pub fn node(&self, index: usize) -> Option<&Node<T>> {
        self.nodes.get(index)
    }
    /// Calculate the degree of freedom
    ///
    /// # Examples
    ///
    /// ```
    /// use cspace::*;
    /// let l0 = JointBuilder::new()
    ///     .joint_type(JointType::Fixed)
    ///     .into_node();
    /// let l1 : Node<f64> = JointBuilder::new()
    ///     .joint_type(JointType::Rotational{axis: Vector3::y_axis()})
    ///     .into_node();
    /// l1.set_parent(&l0);
    /// let tree = Chain::from_root(l0);
    /// assert_eq!(tree.dof(), 1);
    /// ```
    pub fn dof(&self) -> usize {
        self.movable_nodes.len()
    }
    /// Find the joint by name
    ///
    /// # Examples
    ///
    /// ```
    /// use cspace::*;
    ///
    /// let l0 = Node::new(JointBuilder::new()
    ///     .name("fixed")
    ///     .finalize());
    /// let l1 = Node::new(JointBuilder::new()
    ///     .name("pitch1")
    ///     .translation(Translation3::new(0.0, 0.1, 0.0))
    ///     .joint_type(JointType::Rotational{axis: Vector3::y_axis()})
    ///     .finalize());
    /// l1.set_parent(&l0);
    /// let tree = Chain::<f64>::from_root(l0);
    /// let j = tree.find("pitch1").unwrap();
    /// j.set_joint_position(0.5).unwrap();
    /// assert_eq!(j.joint_position().unwrap(), 0.5);
    /// ```
    pub fn find(&self, joint_name: &str) -> Option<&Node<T>> {
        self.iter().find(|node| node.joint().name == joint_name)
    }
    /// Find the joint index (index of the movable joint) by name
    pub fn joint_index(&self, joint_name: &str) -> Option<usize> {
        self.movable_nodes
            .iter()
            .position(|&i| self.nodes[i].joint().name == joint_name)
    }
    /// Find the link index by name
    pub fn link_index(&self, link_name: &str) -> Option<usize> {
        self.iter().position(|node| node.link_name() == link_name)
    }
    /// Get the positions of the joints
    ///
    /// `FixedJoint` is ignored. the length is the same with `dof()`
    pub fn joint_positions(&self) -> Vec<T> {
        self.iter().filter_map(|node| node.joint_position()).collect()
    }
    /// Position of the joint by joint index
    pub fn joint_position(&self, joint_index: usize) -> Option<T> {
        self.joint_node(joint_index)
            .and_then(|node| node.joint_position())
    }

    /// Set the positions of the joints
    ///
    /// `FixedJoints` are ignored. the input number must be equal with `dof()`
    pub fn set_joint_positions(&self, positions_vec: &[T]) -> Result<(), Error> {
        if positions_vec.len() != self.dof() {
            return Err(Error::SizeMismatchError {
                input: positions_vec.len(),
                required: self.dof(),
            });
        }
        for (&i, position) in self.movable_nodes.iter().zip(positions_vec.iter()) {
            self.nodes[i].set_joint_position(position.clone())?;
        }
        Ok(())
    }
    /// Fast, but without check, dangerous `set_joint_positions`
    #[inline]
    pub fn set_joint_positions_unchecked(&self, positions_vec: &[T]) {
        for (&i, position) in self.movable_nodes.iter().zip(positions_vec.iter()) {
            self.nodes[i].set_joint_position_unchecked(position.clone());
        }
    }
    /// Set the position of one joint by joint index, without limit check
    ///
    /// An invalid index is ignored.
    #[inline]
    pub fn set_joint_position_unchecked(&self, joint_index: usize, position: T) {
        if let Some(node) = self.joint_node(joint_index) {
            node.set_joint_position_unchecked(position);
        }
    }
    pub fn limits(&self) -> Vec<Option<Range<T>>> {
        self.iter_joints().map(|joint| joint.limits.clone()).collect()
    }
    /// Names of the movable joints
    pub fn names(&self) -> Vec<String> {
        self.iter_joints().map(|joint| joint.name.clone()).collect()
    }
    /// Names of all links, in link index order
    pub fn link_names(&self) -> Vec<String> {
        self.iter().map(|node| node.link_name()).collect()
    }
    /// Node of the movable joint by joint index
    pub fn joint_node(&self, joint_index: usize) -> Option<&Node<T>> {
        self.movable_nodes
            .get(joint_index)
            .map(|&node_index| &self.nodes[node_index])
    }
    /// Link index of the movable joint
    pub fn joint_link_index(&self, joint_index: usize) -> Option<usize> {
        self.movable_nodes.get(joint_index).copied()
    }
    /// Index of the parent link
    pub fn parent_index(&self, link_index: usize) -> Option<usize> {
        self.parents.get(link_index).copied().flatten()
    }
    /// `true` if the link `ancestor` is `descendant` itself or one of its ancestors
    ///
    /// # Examples
    ///
    /// ```
    /// use cspace::*;
    ///
    /// let l0 = JointBuilder::<f64>::new().into_node();
    /// let l1 = JointBuilder::new().into_node();
    /// let l2 = JointBuilder::new().into_node();
    /// l1.set_parent(&l0);
    /// l2.set_parent(&l0);
    /// let tree = Chain::from_root(l0);
    /// assert!(tree.is_ancestor_or_self(0, 2));
    /// assert!(tree.is_ancestor_or_self(1, 1));
    /// assert!(!tree.is_ancestor_or_self(1, 2));
    /// ```
    pub fn is_ancestor_or_self(&self, ancestor: usize, descendant: usize) -> bool {
        let mut current = Some(descendant);
        while let Some(index) = current {
            if index == ancestor {
                return true;
            }
            current = self.parent_index(index);
        }
        false
    }
    /// Iterate link indices from the link to the root, the link itself first
    pub fn iter_ancestor_indices(&self, link_index: usize) -> impl Iterator<Item = usize> + '_ {
        let start = if link_index < self.nodes.len() {
            Some(link_index)
        } else {
            None
        };
        std::iter::successors(start, move |&index| self.parent_index(index))
    }

    /// Calculate the transforms of all nodes relative to the root of this chain
    ///
    /// The results are cached in every joint, see `Node::world_transform()`.
    pub fn update_transforms(&self) -> Vec<Isometry3<T>> {
        let mut transforms: Vec<Isometry3<T>> = Vec::with_capacity(self.nodes.len());
        for (node, parent) in self.nodes.iter().zip(self.parents.iter()) {
            let local = node.local_transform();
            let trans = match parent {
                Some(p) => transforms[*p].clone() * local,
                None => local,
            };
            node.joint().set_world_transform(trans.clone());
            transforms.push(trans);
        }
        transforms
    }
}

#[test]
fn it_works() {
    use na::{Translation3, Vector3};

    let joint0 = JointBuilder::new()
        .name("j0")
        .translation(Translation3::new(0.0, 0.1, 0.0))
        .joint_type(JointType::Rotational {
            axis: Vector3::y_axis(),
        })
        .into_node();
    let joint1 = JointBuilder::new()
        .translation(Translation3::new(0.0, 0.1, 0.1))
        .name("j1")
        .joint_type(JointType::Rotational {
            axis: Vector3::y_axis(),
        })
        .into_node();
    let joint2 = JointBuilder::new()
        .name("j2")
        .translation(Translation3::new(0.0, 0.1, 0.1))
        .joint_type(JointType::Fixed)
        .into_node();
    let joint3 = JointBuilder::new()
        .name("j3")
        .translation(Translation3::new(0.0, 0.1, 0.2))
        .joint_type(JointType::Linear {
            axis: Vector3::z_axis(),
        })
        .into_node();
    joint1.set_parent(&joint0);
    joint2.set_parent(&joint1);
    joint3.set_parent(&joint0);

    let chain = Chain::<f64>::from_root(joint0);
    assert_eq!(chain.len(), 4);
    assert_eq!(chain.dof(), 3);
    assert_eq!(chain.names(), vec!["j0", "j1", "j3"]);
    assert_eq!(chain.link_names(), vec!["j0", "j1", "j2", "j3"]);
    assert_eq!(chain.parent_index(0), None);
    assert_eq!(chain.parent_index(2), Some(1));
    assert_eq!(chain.parent_index(3), Some(0));
    assert_eq!(chain.joint_link_index(2), Some(3));
    assert_eq!(chain.joint_index("j3"), Some(2));
    assert_eq!(chain.joint_index("j2"), None);
    assert!(chain.is_ancestor_or_self(1, 2));
    assert!(!chain.is_ancestor_or_self(3, 2));
    assert_eq!(chain.iter_ancestor_indices(2).collect::<Vec<_>>(), vec![2, 1, 0]);

    assert!(chain.set_joint_positions(&[0.1, 0.2]).is_err());
    chain.set_joint_positions(&[0.0, 0.2, 0.3]).unwrap();
    assert_eq!(chain.joint_positions(), vec![0.0, 0.2, 0.3]);
    assert_eq!(chain.joint_position(2), Some(0.3));

    let transforms = chain.update_transforms();
    assert!((transforms[3].translation.vector.z - 0.5).abs() < 1e-10);
    assert_eq!(
        transforms[3],
        chain.node(3).unwrap().world_transform().unwrap()
    );
}
