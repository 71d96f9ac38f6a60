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
//! Link and its collision geometry
use na::{Isometry3, RealField, Vector3};
use nalgebra as na;

#[derive(Debug, Clone)]
pub enum Geometry<T: RealField> {
    Box { depth: T, width: T, height: T },
    Cylinder { radius: T, length: T },
    Capsule { radius: T, length: T },
    Sphere { radius: T },
    Mesh { filename: String, scale: Vector3<T> },
}

#[derive(Debug, Clone)]
pub struct Collision<T: RealField> {
    pub name: String,
    pub origin: Isometry3<T>,
    pub geometry: Geometry<T>,
}

impl<T> Collision<T>
where
    T: RealField,
{
    pub fn new(name: &str, origin: Isometry3<T>, geometry: Geometry<T>) -> Self {
        Self {
            name: name.to_owned(),
            origin,
            geometry,
        }
    }
}

/// Rigid part attached to the end of a joint
///
/// Links without collisions are skipped by
/// `Configuration::affected_links_filtered(true)`.
#[derive(Debug, Clone)]
pub struct Link<T: RealField> {
    pub name: String,
    pub collisions: Vec<Collision<T>>,
}

impl<T> Link<T>
where
    T: RealField,
{
    pub fn has_geometry(&self) -> bool {
        !self.collisions.is_empty()
    }
}

/// Build a `Link`
///
/// # Examples
///
/// ```
/// use cspace::link::*;
/// use nalgebra as na;
///
/// let link = LinkBuilder::<f64>::new()
///     .name("hand")
///     .add_collision(Collision::new(
///         "palm",
///         na::Isometry3::identity(),
///         Geometry::Sphere { radius: 0.05 },
///     ))
///     .finalize();
/// assert!(link.has_geometry());
/// ```
#[derive(Debug, Clone)]
pub struct LinkBuilder<T>
where
    T: RealField,
{
    name: String,
    collisions: Vec<Collision<T>>,
}

impl<T> Default for LinkBuilder<T>
where
    T: RealField,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LinkBuilder<T>
where
    T: RealField,
{
    pub fn new() -> Self {
        Self {
            name: "".to_owned(),
            collisions: Vec::new(),
        }
    }
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_owned();
        self
    }
    pub fn add_collision(mut self, collision: Collision<T>) -> Self {
        self.collisions.push(collision);
        self
    }
    pub fn finalize(self) -> Link<T> {
        Link {
            name: self.name,
            collisions: self.collisions,
        }
    }
}
