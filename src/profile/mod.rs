//! Startup profile schema and normalization
//!
//! - **schema**: the fixed set of required fields, grouped into profile,
//!   financial, risk and growth categories
//! - **normalize**: turns an arbitrary parsed key/value mapping into an
//!   [`ExtractedProfile`] holding exactly one value per schema field

pub mod schema;
mod normalize;

pub use normalize::{normalize_key, normalize_profile, normalize_value, ExtractedProfile, PLACEHOLDER};
pub use schema::{FieldGroup, FieldSpec, FIELDS};
