// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Instance orchestration on top of the Kubernetes managers.

pub mod service;
pub mod watch;

pub use service::K8sInstanceService;
pub use watch::watch_instance_state;
