// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pricing engine for made-to-order leather goods.
//!
//! [`compute_price`] is a pure function from dimensions and cost
//! configuration to a [`PriceBreakdown`](atelier_core::types::PriceBreakdown).

pub mod engine;
pub mod format;

pub use engine::{PricingError, PricingParams, compute_price};
pub use format::money;
