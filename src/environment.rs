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
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

use crate::body::Body;

#[derive(Debug, Default)]
pub struct EnvironmentImpl {
    bodies: Vec<Rc<Body>>,
}

/// Shared handle of the world which owns the bodies
///
/// Clones refer to the same world. Bodies only keep a weak reference to it.
///
/// # Examples
///
/// ```
/// use cspace::*;
///
/// let env = Environment::new();
/// let body = env.add_body(Body::new("box", Chain::from_root(JointBuilder::new().into_node())));
/// assert!(body.env().unwrap().ptr_eq(&env));
/// assert_eq!(env.body("box").unwrap().name(), "box");
/// assert!(env.body("ball").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Environment(Rc<RefCell<EnvironmentImpl>>);

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }
    pub(crate) fn upgrade(weak: &Weak<RefCell<EnvironmentImpl>>) -> Option<Self> {
        weak.upgrade().map(Environment)
    }
    /// Take the ownership of the body and return the shared handle
    pub fn add_body(&self, body: Body) -> Rc<Body> {
        if self.body(body.name()).is_some() {
            warn!("body {} is already in the environment", body.name());
        }
        body.set_env(Rc::downgrade(&self.0));
        let body = Rc::new(body);
        debug!("add body {} (dof = {})", body.name(), body.dof());
        self.0.borrow_mut().bodies.push(body.clone());
        body
    }
    /// Returns `false` if the body was not in this environment
    pub fn remove_body(&self, body: &Rc<Body>) -> bool {
        let mut env = self.0.borrow_mut();
        let num = env.bodies.len();
        env.bodies.retain(|b| !Rc::ptr_eq(b, body));
        if num == env.bodies.len() {
            return false;
        }
        body.set_env(Weak::new());
        true
    }
    /// Find the first body with the name
    pub fn body(&self, name: &str) -> Option<Rc<Body>> {
        self.0
            .borrow()
            .bodies
            .iter()
            .find(|b| b.name() == name)
            .cloned()
    }
    pub fn bodies(&self) -> Vec<Rc<Body>> {
        self.0.borrow().bodies.clone()
    }
    /// `true` if both handles refer to the same world
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
