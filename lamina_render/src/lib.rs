// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositing plans and damage tracking for lamina.
//!
//! This crate turns the result of [`lamina_core`]'s layer assignment into
//! something a compositor backend can consume. It defines:
//!
//! - [`PlanItem`]: one composited backing, with the layers squashed into it
//! - [`CompositingPlan`]: every backing of a tree in paint order
//! - [`DamageRegion`]: spatial damage derived from paint invalidations

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod damage;
mod plan;

pub use damage::DamageRegion;
pub use plan::{CompositingPlan, PlanItem};
