//! Species catalog: plants and the care requirements they carry.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A species catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plant {
    pub id: Uuid,
    pub name: String,
    pub scientific_name: Option<String>,
    pub growth_cycle_id: Option<Uuid>,
    pub requirement_profile_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// A stored set of care requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementProfile {
    pub id: Uuid,
    pub requirements: Requirements,
}

/// Periodic care inputs for a species.
///
/// Every field is optional: absence means "not applicable", never zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Requirements {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water_min_ml: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water_max_ml: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub go_krupa_ml_weekly: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panchagavya_l_monthly: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashagavya_l_monthly: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jeevamrutha_l_monthly: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vermicompost_ml_monthly: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cowpat_kg_monthly: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spray_3g_g_monthly: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mustard_g_monthly: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulse_l_monthly: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buttermilk_ml_monthly: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bo_ml_monthly: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faa_ml_monthly: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub em_ml_monthly: Option<Decimal>,
}

/// How often a care input recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Daily,
    Weekly,
    Monthly,
}

/// One recurring input extracted from a [`Requirements`] set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demand {
    /// The input consumed, e.g. `"water"` or `"panchagavya"`.
    pub resource: &'static str,
    pub cadence: Cadence,
    pub quantity: Decimal,
    pub unit: &'static str,
}

impl Requirements {
    /// Returns the recurring demands this profile describes, in a fixed order.
    ///
    /// Daily water uses the minimum of the range, falling back to the maximum
    /// when only the ceiling is known. Non-positive quantities are dropped.
    pub fn demands(&self) -> Vec<Demand> {
        let water = self.water_min_ml.or(self.water_max_ml);
        let fields: [(&'static str, Cadence, Option<Decimal>, &'static str); 14] = [
            ("water", Cadence::Daily, water, "ml"),
            ("go krupa", Cadence::Weekly, self.go_krupa_ml_weekly, "ml"),
            ("panchagavya", Cadence::Monthly, self.panchagavya_l_monthly, "l"),
            ("dashagavya", Cadence::Monthly, self.dashagavya_l_monthly, "l"),
            ("jeevamrutha", Cadence::Monthly, self.jeevamrutha_l_monthly, "l"),
            ("vermicompost", Cadence::Monthly, self.vermicompost_ml_monthly, "ml"),
            ("cowpat", Cadence::Monthly, self.cowpat_kg_monthly, "kg"),
            ("3g spray", Cadence::Monthly, self.spray_3g_g_monthly, "g"),
            ("mustard", Cadence::Monthly, self.mustard_g_monthly, "g"),
            ("pulse", Cadence::Monthly, self.pulse_l_monthly, "l"),
            ("buttermilk", Cadence::Monthly, self.buttermilk_ml_monthly, "ml"),
            ("bo", Cadence::Monthly, self.bo_ml_monthly, "ml"),
            ("faa", Cadence::Monthly, self.faa_ml_monthly, "ml"),
            ("em", Cadence::Monthly, self.em_ml_monthly, "ml"),
        ];

        fields
            .into_iter()
            .filter_map(|(resource, cadence, quantity, unit)| {
                quantity
                    .filter(|q| q.is_sign_positive() && !q.is_zero())
                    .map(|quantity| Demand {
                        resource,
                        cadence,
                        quantity,
                        unit,
                    })
            })
            .collect()
    }

    /// Checks that every present quantity is positive and the water range is ordered.
    pub fn validate(&self) -> Result<(), String> {
        let named = [
            ("water_min_ml", self.water_min_ml),
            ("water_max_ml", self.water_max_ml),
            ("go_krupa_ml_weekly", self.go_krupa_ml_weekly),
            ("panchagavya_l_monthly", self.panchagavya_l_monthly),
            ("dashagavya_l_monthly", self.dashagavya_l_monthly),
            ("jeevamrutha_l_monthly", self.jeevamrutha_l_monthly),
            ("vermicompost_ml_monthly", self.vermicompost_ml_monthly),
            ("cowpat_kg_monthly", self.cowpat_kg_monthly),
            ("spray_3g_g_monthly", self.spray_3g_g_monthly),
            ("mustard_g_monthly", self.mustard_g_monthly),
            ("pulse_l_monthly", self.pulse_l_monthly),
            ("buttermilk_ml_monthly", self.buttermilk_ml_monthly),
            ("bo_ml_monthly", self.bo_ml_monthly),
            ("faa_ml_monthly", self.faa_ml_monthly),
            ("em_ml_monthly", self.em_ml_monthly),
        ];
        for (field, value) in named {
            if let Some(q) = value
                && (q.is_zero() || q.is_sign_negative())
            {
                return Err(format!("{field} must be positive, got {q}"));
            }
        }
        if let (Some(min), Some(max)) = (self.water_min_ml, self.water_max_ml)
            && min > max
        {
            return Err(format!(
                "water_min_ml ({min}) must not exceed water_max_ml ({max})"
            ));
        }
        Ok(())
    }
}
