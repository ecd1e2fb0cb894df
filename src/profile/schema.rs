//! The fixed set of fields every extracted startup profile carries
//!
//! Field names are canonical snake_case keys. Each field belongs to one
//! [`FieldGroup`] and carries a short hint used when the prompt template
//! asks the model to fill it in.

use serde::{Deserialize, Serialize};

/// Conceptual grouping of profile fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroup {
    Profile,
    Financial,
    Risk,
    Growth,
}

/// One canonical profile field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub group: FieldGroup,
    /// Instruction shown to the model in the structured-data template
    pub hint: &'static str,
}

const fn field(name: &'static str, group: FieldGroup, hint: &'static str) -> FieldSpec {
    FieldSpec { name, group, hint }
}

use FieldGroup::{Financial, Growth, Profile, Risk};

/// All required fields, in template order.
pub const FIELDS: &[FieldSpec] = &[
    field("company_name", Profile, "Search for official company name"),
    field("website_url", Profile, "Search for the primary official website of the company and add the link here"),
    field("industry", Profile, "Search for industry classification"),
    field("valuation", Profile, "Search latest valuation from multiple sources"),
    field("funding_rounds", Profile, "Search total rounds from funding databases"),
    field("type_of_funding", Profile, "Search funding types received"),
    field("founders_info", Profile, "Search founder backgrounds"),
    field("number_of_employees", Profile, "Search current employee count. Just give a number without additional text"),
    field("headquarters", Profile, "Search headquarters location"),
    field("business_model", Profile, "Analyze revenue generation model"),
    field("revenue", Financial, "Search annual revenue from financial reports"),
    field("arr", Financial, "Search/calculate annual recurring revenue"),
    field("profit", Financial, "Search net profit from financial statements"),
    field("current_investors_stake", Financial, "Search investor ownership data"),
    field("tam", Financial, "Search total addressable market analysis"),
    field("liabilities", Financial, "Search total liabilities from balance sheet"),
    field("cac", Financial, "Search/estimate customer acquisition cost"),
    field("burn_rate", Financial, "Search/calculate monthly burn rate"),
    field("runway", Financial, "Calculate: cash reserves / monthly burn rate"),
    field("cash_reserve", Financial, "Search current cash and equivalents"),
    field("total_runway", Financial, "Calculate total runway considering funding pipeline"),
    field("fixed_assets", Financial, "Search fixed assets from balance sheet"),
    field("raw_materials_cost", Financial, "Search cost of goods sold components"),
    field("inventory_cost", Financial, "Search inventory values from current assets. Give numbers."),
    field("marketing_cost", Financial, "Search marketing and advertising expenses. Give numbers."),
    field("operations_cost", Financial, "Search operational expenses breakdown. Give numbers."),
    field("risk_summary", Risk, "Analyze overall risk assessment"),
    field("operational_risks", Risk, "Identify operational challenges and risks"),
    field("customer_risks", Risk, "Assess customer-related risks"),
    field("risk_gauge", Risk, "A numeric risk score out of 5 using the Scorecard and other risk frameworks"),
    field("risk_gauge_reason", Risk, "A concise summary justifying the risk score, covering all risk areas"),
    field("growth", Growth, "Analyze growth rate and trajectory"),
    field("expanding_to_cities", Growth, "Search geographic expansion plans"),
    field("usp", Growth, "Identify unique selling proposition"),
    field("market_demand", Growth, "Assess market demand indicators"),
    field("new_products", Growth, "Search product development pipeline"),
    field("patents", Growth, "Search patent portfolio information"),
    field("customer_feedback", Growth, "Search customer satisfaction metrics"),
    field("innovation_rate", Growth, "Assess R&D investment and innovation pace"),
];

/// Number of fields in the schema
pub fn field_count() -> usize {
    FIELDS.len()
}

/// Whether `name` (already normalized) is a schema field
pub fn is_field(name: &str) -> bool {
    position(name).is_some()
}

/// Template position of a field, used to order serialized profiles
pub fn position(name: &str) -> Option<usize> {
    FIELDS.iter().position(|f| f.name == name)
}

/// Fields belonging to one group, in template order
pub fn fields_in(group: FieldGroup) -> impl Iterator<Item = &'static FieldSpec> {
    FIELDS.iter().filter(move |f| f.group == group)
}
