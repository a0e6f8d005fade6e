// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Domain types: what an instance is made of and the state reported back for it.

pub mod instance;
pub mod state;

pub use instance::{Flavour, Image, ImageVolume, InstanceSpec, Protocol, User};
pub use state::{InstanceDeletion, InstanceNetwork, K8sInstance, K8sInstanceState, K8sInstanceStatus};
