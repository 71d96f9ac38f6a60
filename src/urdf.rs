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
//! Load a `Chain` or a `Body` from URDF
//!
//! # Examples
//!
//! ```
//! let body = cspace::Body::from_urdf_file("urdf/sample.urdf").unwrap();
//! assert_eq!(body.name(), "sample");
//! assert_eq!(body.dof(), 4);
//! ```
use na::RealField;
use nalgebra as na;
use simba::scalar::SubsetOf;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::body::Body;
use crate::chain::Chain;
use crate::errors::*;
use crate::joint::*;
use crate::link::*;
use crate::node::*;

/// Root joint name, added on top of the root link
pub const ROOT_JOINT_NAME: &str = "root";

fn vector3_from<T: RealField>(v: &[f64]) -> na::Vector3<T> {
    na::Vector3::new(na::convert(v[0]), na::convert(v[1]), na::convert(v[2]))
}

fn isometry_from<T: RealField>(pose: &urdf_rs::Pose) -> na::Isometry3<T> {
    na::Isometry3::from_parts(
        na::Translation3::from(vector3_from(&pose.xyz[..])),
        na::UnitQuaternion::from_euler_angles(
            na::convert(pose.rpy[0]),
            na::convert(pose.rpy[1]),
            na::convert(pose.rpy[2]),
        ),
    )
}

fn geometry_from<T: RealField>(geometry: &urdf_rs::Geometry) -> Geometry<T> {
    match geometry {
        urdf_rs::Geometry::Box { size } => Geometry::Box {
            depth: na::convert(size[0]),
            width: na::convert(size[1]),
            height: na::convert(size[2]),
        },
        urdf_rs::Geometry::Cylinder { radius, length } => Geometry::Cylinder {
            radius: na::convert(*radius),
            length: na::convert(*length),
        },
        urdf_rs::Geometry::Capsule { radius, length } => Geometry::Capsule {
            radius: na::convert(*radius),
            length: na::convert(*length),
        },
        urdf_rs::Geometry::Sphere { radius } => Geometry::Sphere {
            radius: na::convert(*radius),
        },
        urdf_rs::Geometry::Mesh { filename, scale } => Geometry::Mesh {
            filename: filename.to_owned(),
            scale: scale
                .as_ref()
                .map_or_else(|| na::Vector3::new(T::one(), T::one(), T::one()), |s| {
                    vector3_from(&s[..])
                }),
        },
    }
}

impl<T> From<&urdf_rs::Link> for Link<T>
where
    T: RealField,
{
    fn from(urdf_link: &urdf_rs::Link) -> Self {
        let mut builder = LinkBuilder::new().name(&urdf_link.name);
        for collision in &urdf_link.collision {
            builder = builder.add_collision(Collision::new(
                collision.name.as_deref().unwrap_or(""),
                isometry_from(&collision.origin),
                geometry_from(&collision.geometry),
            ));
        }
        builder.finalize()
    }
}

impl<T> From<&urdf_rs::Joint> for Joint<T>
where
    T: RealField + SubsetOf<f64>,
{
    fn from(urdf_joint: &urdf_rs::Joint) -> Self {
        let axis = || na::Unit::new_normalize(vector3_from(&urdf_joint.axis.xyz[..]));
        let limits = || {
            let (lower, upper) = (urdf_joint.limit.lower, urdf_joint.limit.upper);
            if lower > upper {
                warn!("joint {} has inverted limits, ignored", urdf_joint.name);
                return None;
            }
            Some(Range::new(na::convert(lower), na::convert(upper)))
        };
        let (joint_type, limits) = match urdf_joint.joint_type {
            urdf_rs::JointType::Revolute => (JointType::Rotational { axis: axis() }, limits()),
            urdf_rs::JointType::Continuous => (JointType::Rotational { axis: axis() }, None),
            urdf_rs::JointType::Prismatic => (JointType::Linear { axis: axis() }, limits()),
            _ => (JointType::Fixed, None),
        };
        JointBuilder::new()
            .name(&urdf_joint.name)
            .joint_type(joint_type)
            .limits(limits)
            .origin(isometry_from(&urdf_joint.origin))
            .finalize()
    }
}

fn get_root_link_name(robot: &urdf_rs::Robot) -> Option<String> {
    let mut child_joint_map = HashMap::<&str, &urdf_rs::Joint>::new();
    for j in &robot.joints {
        if let Some(old) = child_joint_map.insert(&j.child.link, j) {
            warn!("link {} has more than one parent joint: {}", j.child.link, old.name);
        }
    }
    let mut parent_link_name: &str = &robot.links.first()?.name;
    let mut steps = 0;
    while let Some(joint) = child_joint_map.get(parent_link_name) {
        parent_link_name = &joint.parent.link;
        steps += 1;
        if steps > robot.joints.len() {
            warn!("the joints of {} make a loop", robot.name);
            break;
        }
    }
    Some(parent_link_name.to_owned())
}

impl<T> From<&urdf_rs::Robot> for Chain<T>
where
    T: RealField + SubsetOf<f64>,
{
    /// The root node is a fixed joint named `"root"` holding the root link.
    /// Every joint becomes a node holding its child link.
    fn from(robot: &urdf_rs::Robot) -> Self {
        let link_map = robot
            .links
            .iter()
            .map(|l| (l.name.as_str(), l))
            .collect::<HashMap<_, _>>();
        let root_node = JointBuilder::<T>::new().name(ROOT_JOINT_NAME).into_node();
        let root_link_name = get_root_link_name(robot);
        if let Some(link) = root_link_name.as_deref().and_then(|name| link_map.get(name)) {
            root_node.set_link(Some(Link::from(*link)));
        }
        let mut child_link_to_node = HashMap::<&str, Node<T>>::new();
        if let Some(name) = root_link_name.as_deref() {
            child_link_to_node.insert(name, root_node.clone());
        }
        let joint_nodes = robot
            .joints
            .iter()
            .map(|urdf_joint| {
                let node = Node::new(Joint::from(urdf_joint));
                if let Some(link) = link_map.get(urdf_joint.child.link.as_str()) {
                    node.set_link(Some(Link::from(*link)));
                }
                child_link_to_node
                    .entry(urdf_joint.child.link.as_str())
                    .or_insert_with(|| node.clone());
                node
            })
            .collect::<Vec<_>>();
        for (urdf_joint, node) in robot.joints.iter().zip(joint_nodes.iter()) {
            match child_link_to_node.get(urdf_joint.parent.link.as_str()) {
                Some(parent) => node.set_parent(parent),
                None => {
                    warn!(
                        "parent link {} of joint {} is not found",
                        urdf_joint.parent.link, urdf_joint.name
                    );
                    node.set_parent(&root_node);
                }
            }
        }
        debug!("loaded {} joints from {}", robot.joints.len(), robot.name);
        Chain::from_root(root_node)
    }
}

impl Body {
    pub fn from_urdf_robot(robot: &urdf_rs::Robot) -> Self {
        Body::new(&robot.name, Chain::from(robot))
    }
    /// Parse URDF text
    pub fn from_urdf_str(urdf: &str) -> Result<Self, Error> {
        Ok(Self::from_urdf_robot(&urdf_rs::read_from_string(urdf)?))
    }
    pub fn from_urdf_file<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        Ok(Self::from_urdf_robot(&urdf_rs::read_file(path)?))
    }
}

#[test]
fn test_tree() {
    let robo = urdf_rs::read_file("urdf/sample.urdf").unwrap();
    assert_eq!(robo.name, "sample");
    assert_eq!(robo.links.len(), 6);

    let tree = Chain::<f64>::from(&robo);
    assert_eq!(tree.iter().count(), 6);
    assert_eq!(tree.dof(), 4);
    assert_eq!(tree.names(), vec!["pan", "tilt", "slide", "wheel"]);
    assert_eq!(
        tree.link_names(),
        vec!["base_link", "pan_link", "tilt_link", "slide_link", "wheel_link", "sensor_link"]
    );
    let limits = tree.limits();
    assert_eq!(limits[0].unwrap().min, -2.0);
    assert_eq!(limits[2].unwrap().max, 0.5);
    assert!(limits[3].is_none());
    assert!(tree.node(1).unwrap().has_geometry());
    assert!(!tree.node(4).unwrap().has_geometry());
}
