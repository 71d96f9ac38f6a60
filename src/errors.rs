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
use crate::affine::AffineDofs;
use thiserror::Error;

/// The reason of joint, configuration and environment errors
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to set the joint position because the input is out of the range of joint limits
    #[error(
        "joint: {joint_name} is out of limit: {position} [{min_limit}, {max_limit}]"
    )]
    OutOfLimitError {
        /// name of the joint
        joint_name: String,
        /// position of the joint
        position: f64,
        /// max position of the joint
        max_limit: f64,
        /// min position of the joint
        min_limit: f64,
    },
    /// Gave invalid size of vec as input
    #[error("size mismatch input = {input}, required = {required}")]
    SizeMismatchError {
        /// input size
        input: usize,
        /// required size
        required: usize,
    },
    /// Tried to set the position of a fixed joint
    #[error("joint {joint_name} is fixed, the position cannot be set")]
    SetToFixedError {
        /// name of the joint
        joint_name: String,
    },
    /// The configuration does not provide the operation at all
    #[error("{operation} is not supported by {configuration}")]
    UnsupportedOperationError {
        /// name of the operation
        operation: &'static str,
        /// name of the configuration type
        configuration: &'static str,
    },
    /// Joint index does not exist in the body
    #[error("joint index {index} is invalid for body {body_name} (dof = {dof})")]
    InvalidJointIndexError {
        /// the wrong index
        index: usize,
        /// name of the body
        body_name: String,
        /// number of joints of the body
        dof: usize,
    },
    /// Joint index appears twice in an active joint list
    #[error("joint index {index} is listed more than once")]
    DuplicateJointIndexError {
        /// the duplicated index
        index: usize,
    },
    /// Both `ROTATION_AXIS` and `ROTATION_3D` are selected
    #[error("affine dofs {0:?} select more than one rotation mode")]
    InvalidAffineDofsError(AffineDofs),
    /// Link index does not exist in the body
    #[error("link index {index} is invalid for body {body_name} (links = {num_links})")]
    LinkIndexError {
        /// the wrong index
        index: usize,
        /// name of the body
        body_name: String,
        /// number of links of the body
        num_links: usize,
    },
    /// The body was never added to an environment, or the environment is gone
    #[error("body {body_name} does not belong to a live environment")]
    EnvironmentDroppedError {
        /// name of the body
        body_name: String,
    },
    /// Failed to parse the robot description
    #[error("urdf error: {0}")]
    UrdfError(#[from] urdf_rs::UrdfError),
}
