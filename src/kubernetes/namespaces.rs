// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace management utilities

use k8s_openapi::api::core::v1::Namespace;
use kube::api::ObjectMeta;

/// Namespace body; only the name is tracked
pub fn namespace_descriptor(name: &str) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}
