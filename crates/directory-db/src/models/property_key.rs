//! Property key catalog.
//!
//! A fixed list of standard property keys, merged at read time with the
//! distinct custom keys actually present in `user_properties`. Consumers
//! use the catalog to offer consistent key names.

use serde::Serialize;
use sqlx::SqliteExecutor;

use crate::error::DbError;

/// The standard property keys as `(key, description, category)`.
pub const STANDARD_KEYS: &[(&str, &str, &str)] = &[
    // Identity
    ("first_name", "First name", "identity"),
    ("last_name", "Last name", "identity"),
    ("user_type", "User type", "identity"),
    ("authorization_info", "Authorization info", "identity"),
    // Job information
    ("job_title", "Job title", "job"),
    ("company_name", "Company name", "job"),
    ("department", "Department", "job"),
    ("employee_id", "Employee ID", "job"),
    ("employee_type", "Employee type", "job"),
    ("employee_hire_date", "Employee hire date", "job"),
    ("office_location", "Office location", "job"),
    ("manager", "Manager", "job"),
    // Contact information
    ("street_address", "Street address", "contact"),
    ("city", "City", "contact"),
    ("state_or_province", "State or province", "contact"),
    ("zip_or_postal_code", "ZIP or postal code", "contact"),
    ("country_or_region", "Country or region", "contact"),
    ("business_phone", "Business phone", "contact"),
    ("mobile_phone", "Mobile phone", "contact"),
    ("email", "Email", "contact"),
    ("fax_number", "Fax number", "contact"),
    // Parental controls
    ("age_group", "Age group", "parental"),
    ("consent_provided_for_minor", "Consent provided for minor", "parental"),
    // Settings
    ("usage_location", "Usage location", "settings"),
];

/// Catalog entry describing one property key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyKeyInfo {
    pub key: String,
    pub description: String,
    pub category: String,
}

impl PropertyKeyInfo {
    fn standard(key: &str, description: &str, category: &str) -> Self {
        Self {
            key: key.to_string(),
            description: description.to_string(),
            category: category.to_string(),
        }
    }

    fn custom(key: String) -> Self {
        Self {
            key,
            description: "Custom property".to_string(),
            category: "custom".to_string(),
        }
    }
}

/// The standard keys as catalog entries.
#[must_use]
pub fn list_standard() -> Vec<PropertyKeyInfo> {
    STANDARD_KEYS
        .iter()
        .map(|(k, d, c)| PropertyKeyInfo::standard(k, d, c))
        .collect()
}

/// The distinct categories of the standard keys, sorted.
#[must_use]
pub fn categories() -> Vec<&'static str> {
    let mut cats: Vec<&str> = STANDARD_KEYS.iter().map(|(_, _, c)| *c).collect();
    cats.sort_unstable();
    cats.dedup();
    cats
}

/// All property keys: the standard catalog plus any custom keys in use,
/// sorted by key.
pub async fn list_all<'e, E>(executor: E) -> Result<Vec<PropertyKeyInfo>, DbError>
where
    E: SqliteExecutor<'e>,
{
    let custom: Vec<String> =
        sqlx::query_scalar("SELECT DISTINCT key FROM user_properties ORDER BY key")
            .fetch_all(executor)
            .await?;

    Ok(merge_custom(custom))
}

fn merge_custom(custom: Vec<String>) -> Vec<PropertyKeyInfo> {
    let mut all = list_standard();

    for key in custom {
        if !STANDARD_KEYS.iter().any(|(k, _, _)| *k == key) {
            all.push(PropertyKeyInfo::custom(key));
        }
    }

    all.sort_by(|a, b| a.key.cmp(&b.key));
    all
}
