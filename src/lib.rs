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
//! # Configuration space of articulated bodies using [nalgebra](http://nalgebra.org).
//!
//! `cspace` exposes the degrees of freedom (DOFs) of a robot as a flat vector
//! so that an optimizer can read, write, bound and differentiate them.
//!
//! 1. `Configuration`: the common interface
//! 1. `BodyConfiguration`: all the joints of a body
//! 1. `ActiveJointConfiguration`: chosen joints of a body
//! 1. Affine DOFs for the free placement of a body (`AffineDofs`)
//! 1. URDF Loader
//!
//! # Examples
//!
//! ```
//! use cspace::*;
//!
//! let env = Environment::new();
//! let body = env.add_body(Body::from_urdf_file("urdf/sample.urdf").unwrap());
//! let pan = body.chain().joint_index("pan").unwrap();
//! let slide = body.chain().joint_index("slide").unwrap();
//!
//! let config = ActiveJointConfiguration::new(body.clone(), vec![slide, pan])
//!     .unwrap()
//!     .with_affine(AffineOverlay::new(AffineDofs::PLANAR, Vector3::z_axis()).unwrap());
//! assert_eq!(config.dof(), 5);
//!
//! // try a move and roll it back
//! {
//!     let _saver = config.save();
//!     config.set_dof_values(&[0.2, 0.5, 1.0, 0.0, 0.3]).unwrap();
//!     let link = body.chain().link_index("slide_link").unwrap();
//!     let point = body.link_transform(link).unwrap() * Point3::origin();
//!     let jacobian = config.position_jacobian(link, &point).unwrap();
//!     assert_eq!(jacobian.shape(), (5, 3));
//! }
//! assert_eq!(config.get_dof_values(), vec![0.0; 5]);
//! ```
mod active_dofs;
mod active_joint_configuration;
mod affine;
mod body;
mod body_configuration;
mod chain;
mod configuration;
mod environment;
mod errors;
pub mod iterator;
pub mod jacobian;
pub mod joint;
pub mod link;
pub mod node;
pub mod urdf;
use nalgebra as na;

pub use self::active_dofs::ActiveDofs;
pub use self::active_joint_configuration::ActiveJointConfiguration;
pub use self::affine::{AffineDofs, AffineOverlay};
pub use self::body::{AffectedLink, Body, BodyStateSaver, LinkRef};
pub use self::body_configuration::BodyConfiguration;
pub use self::chain::*;
pub use self::configuration::{Configuration, GenericSaver, Saver, SaverScope};
pub use self::environment::Environment;
pub use self::errors::*;
pub use self::joint::{Joint, JointType};
pub use self::link::Link;
pub use self::node::{JointBuilder, Node};

// re-export from nalgebra
pub use na::{DMatrix, Isometry3, Point3, RealField, Translation3, UnitQuaternion, Vector3};
pub use simba::scalar::{SubsetOf, SupersetOf};
