// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Price computation for a rectangular piece of material.
//!
//! All quantities are derived in a fixed order with no intermediate
//! rounding; rounding happens only when a figure is formatted for display.
//!
//! area           = width_cm * height_cm / 100           (dm²)
//! material cost  = area * material price per dm²
//! processing     = area * processing cost per dm²
//! total cost     = material + processing
//! final price    = total cost * markup
//! commission     = final price * commission rate
//! tax            = final price * tax rate
//! net revenue    = final price - commission - tax
//! profit         = net revenue - total cost

use atelier_config::model::PricingConfig;
use atelier_core::types::PriceBreakdown;
use thiserror::Error;

/// Inputs that are rejected instead of producing a degenerate price.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    #[error("invalid material price: {0} per dm² (must be positive)")]
    InvalidMaterialPrice(f64),

    #[error("invalid processing cost: {0} per dm² (must not be negative)")]
    InvalidProcessingCost(f64),

    #[error("invalid markup multiplier: {0} (must be at least 1)")]
    InvalidMarkup(f64),

    #[error("invalid {name} rate: {value}")]
    InvalidRate { name: &'static str, value: f64 },
}

/// Cost configuration for one computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingParams {
    pub material_price_per_dm2: f64,
    pub processing_cost_per_dm2: f64,
    pub payment_commission_rate: f64,
    pub sales_tax_rate: f64,
    pub markup_multiplier: f64,
}

impl PricingParams {
    /// Business-wide configuration combined with a material's unit price.
    pub fn new(config: &PricingConfig, material_price_per_dm2: f64) -> Self {
        Self {
            material_price_per_dm2,
            processing_cost_per_dm2: config.processing_cost_per_dm2,
            payment_commission_rate: config.payment_commission_rate,
            sales_tax_rate: config.sales_tax_rate,
            markup_multiplier: config.markup_multiplier,
        }
    }

    /// Business-wide configuration with the default material price.
    pub fn with_default_material(config: &PricingConfig) -> Self {
        Self::new(config, config.default_material_price_per_dm2)
    }

    fn validate(&self) -> Result<(), PricingError> {
        // Comparisons are written so NaN fails them.
        if !(self.material_price_per_dm2 > 0.0) || self.material_price_per_dm2.is_infinite() {
            return Err(PricingError::InvalidMaterialPrice(
                self.material_price_per_dm2,
            ));
        }
        if !(self.processing_cost_per_dm2 >= 0.0) || self.processing_cost_per_dm2.is_infinite() {
            return Err(PricingError::InvalidProcessingCost(
                self.processing_cost_per_dm2,
            ));
        }
        if !(self.markup_multiplier >= 1.0) || self.markup_multiplier.is_infinite() {
            return Err(PricingError::InvalidMarkup(self.markup_multiplier));
        }
        for (name, value) in [
            ("commission", self.payment_commission_rate),
            ("tax", self.sales_tax_rate),
        ] {
            if !value.is_finite() {
                return Err(PricingError::InvalidRate { name, value });
            }
        }
        Ok(())
    }
}

/// Computes the full price breakdown for a `width_cm` x `height_cm` piece.
pub fn compute_price(
    width_cm: u32,
    height_cm: u32,
    params: &PricingParams,
) -> Result<PriceBreakdown, PricingError> {
    params.validate()?;

    let area_dm2 = f64::from(width_cm) * f64::from(height_cm) / 100.0;
    let material_cost = area_dm2 * params.material_price_per_dm2;
    let processing_cost = area_dm2 * params.processing_cost_per_dm2;
    let total_cost = material_cost + processing_cost;
    let final_price = total_cost * params.markup_multiplier;
    let commission = final_price * params.payment_commission_rate;
    let tax = final_price * params.sales_tax_rate;
    let net_revenue = final_price - commission - tax;
    let profit = net_revenue - total_cost;

    Ok(PriceBreakdown {
        area_dm2,
        material_cost,
        processing_cost,
        total_cost,
        final_price,
        commission,
        tax,
        net_revenue,
        profit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params(material: f64) -> PricingParams {
        PricingParams {
            material_price_per_dm2: material,
            processing_cost_per_dm2: 31.25,
            payment_commission_rate: 0.03,
            sales_tax_rate: 0.06,
            markup_multiplier: 2.5,
        }
    }

    #[test]
    fn reference_order_80_by_20() {
        let b = compute_price(80, 20, &params(25.0)).unwrap();
        assert!((b.area_dm2 - 16.0).abs() < f64::EPSILON);
        assert!((b.material_cost - 400.0).abs() < f64::EPSILON);
        assert!((b.processing_cost - 500.0).abs() < f64::EPSILON);
        assert!((b.total_cost - 900.0).abs() < f64::EPSILON);
        assert!((b.final_price - 2250.0).abs() < f64::EPSILON);
        assert!((b.commission - 67.5).abs() < 1e-9);
        assert!((b.tax - 135.0).abs() < 1e-9);
        assert!((b.net_revenue - 2047.5).abs() < 1e-9);
        assert!((b.profit - 1147.5).abs() < 1e-9);
    }

    #[test]
    fn defaults_from_config() {
        let p = PricingParams::with_default_material(&PricingConfig::default());
        assert_eq!(p, params(25.0));
    }

    #[test]
    fn zero_material_price_is_rejected() {
        assert_eq!(
            compute_price(10, 10, &params(0.0)),
            Err(PricingError::InvalidMaterialPrice(0.0))
        );
    }

    #[test]
    fn negative_processing_cost_is_rejected() {
        let p = PricingParams {
            processing_cost_per_dm2: -1.0,
            ..params(25.0)
        };
        assert_eq!(
            compute_price(10, 10, &p),
            Err(PricingError::InvalidProcessingCost(-1.0))
        );
    }

    #[test]
    fn free_processing_is_allowed() {
        let p = PricingParams {
            processing_cost_per_dm2: 0.0,
            ..params(25.0)
        };
        let b = compute_price(10, 10, &p).unwrap();
        assert!((b.total_cost - b.material_cost).abs() < f64::EPSILON);
    }

    #[test]
    fn markup_below_one_is_rejected() {
        let p = PricingParams {
            markup_multiplier: 0.99,
            ..params(25.0)
        };
        assert_eq!(compute_price(10, 10, &p), Err(PricingError::InvalidMarkup(0.99)));
    }

    #[test]
    fn nan_material_price_is_rejected() {
        assert!(compute_price(10, 10, &params(f64::NAN)).is_err());
    }

    proptest! {
        #[test]
        fn identical_inputs_give_identical_breakdowns(
            w in 1u32..=80,
            h in 1u32..=50,
            material in 0.01f64..1000.0,
        ) {
            let a = compute_price(w, h, &params(material)).unwrap();
            let b = compute_price(w, h, &params(material)).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn breakdown_invariants_hold_exactly(
            w in 1u32..=80,
            h in 1u32..=50,
            material in 0.01f64..1000.0,
            processing in 0.0f64..100.0,
            markup in 1.0f64..10.0,
        ) {
            let p = PricingParams {
                material_price_per_dm2: material,
                processing_cost_per_dm2: processing,
                payment_commission_rate: 0.03,
                sales_tax_rate: 0.06,
                markup_multiplier: markup,
            };
            let b = compute_price(w, h, &p).unwrap();
            prop_assert_eq!(b.total_cost, b.material_cost + b.processing_cost);
            prop_assert_eq!(b.final_price, b.total_cost * markup);
            prop_assert_eq!(b.net_revenue, b.final_price - b.commission - b.tax);
            prop_assert_eq!(b.profit, b.final_price - b.commission - b.tax - b.total_cost);
        }

        #[test]
        fn non_positive_material_price_never_prices(
            material in -1000.0f64..=0.0,
        ) {
            prop_assert!(compute_price(30, 40, &params(material)).is_err());
        }
    }
}
