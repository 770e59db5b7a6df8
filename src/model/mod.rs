// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Declarations that make up a reactive model.
//!
//! A [`Model`] holds classes, the [`Setable`]s their objects carry, the
//! [`Observer`]s that derive state, and memoized [`Constant`]s. Models are
//! immutable once built and shared by every state of a universe.

mod action;
mod class;
mod constant;
mod ids;
mod observer;
mod registry;
mod setable;
mod validation;
mod value;

pub use action::{Action, ActionBody};
pub use class::MutableClass;
pub use constant::{Constant, Deriver};
pub use ids::{ClassId, ConstantId, ObjectId, ObserverId, ParseObjectIdError, SetableId, OBJECT_ID_SEPARATOR};
pub use observer::{Observer, ObserverInstance, Rule};
pub use registry::{Model, ModelBuilder, ROOT_KEY};
pub use setable::{Setable, CONTAINING, PARENT};
pub use validation::validate_model;
pub use value::Value;
