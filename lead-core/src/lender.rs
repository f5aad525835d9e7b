//! Lender configuration

use crate::lenient;
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// How the dashboard's backend authenticates against a lender API
///
/// A missing value means `None`; a value this dashboard does not know
/// becomes `Unknown` so one odd row never breaks the lender list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    #[default]
    None,
    ApiKey,
    Bearer,
    Basic,
    Unknown,
}

impl AuthType {
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "none" => AuthType::None,
            "api_key" | "apikey" => AuthType::ApiKey,
            "bearer" => AuthType::Bearer,
            "basic" => AuthType::Basic,
            _ => AuthType::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for AuthType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Null => AuthType::None,
            serde_json::Value::String(raw) => AuthType::from_wire(&raw),
            _ => AuthType::Unknown,
        })
    }
}

/// Configured buyer of leads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lender {
    #[serde(default, deserialize_with = "lenient::int")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub api_endpoint: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub auth_type: AuthType,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub min_credit_score: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub min_loan_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub max_loan_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub accepted_loan_purposes: Vec<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub price_per_lead: Decimal,
    #[serde(default, deserialize_with = "lenient::int")]
    pub priority: i64,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_active: bool,
    #[serde(default)]
    pub field_mapping: serde_json::Value,
    #[serde(default)]
    pub custom_headers: serde_json::Value,
}

impl Lender {
    /// Whether a loan request falls inside this lender's amount band
    pub fn accepts_amount(&self, amount: Decimal) -> bool {
        self.min_loan_amount.map_or(true, |min| amount >= min)
            && self.max_loan_amount.map_or(true, |max| amount <= max)
    }

    /// Key with all but the last four characters masked
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_ref().map(|key| {
            let visible: String = key
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("{}{}", "•".repeat(key.chars().count().saturating_sub(4)), visible)
        })
    }
}

/// Create/update payload sent to the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LenderInput {
    pub name: String,
    pub api_endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub auth_type: AuthType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_credit_score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_loan_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_loan_amount: Option<Decimal>,
    #[serde(default)]
    pub accepted_loan_purposes: Vec<String>,
    #[serde(default)]
    pub price_per_lead: Decimal,
    #[serde(default)]
    pub priority: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub field_mapping: serde_json::Value,
    #[serde(default)]
    pub custom_headers: serde_json::Value,
}

fn default_active() -> bool {
    true
}

impl LenderInput {
    /// Reject payloads the backend would store in an unusable state
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidLender("name is required".to_string()));
        }

        let endpoint = self.api_endpoint.trim();
        if endpoint.is_empty() {
            return Err(Error::InvalidLender("api_endpoint is required".to_string()));
        }
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(Error::InvalidLender(format!(
                "api_endpoint must be an http(s) URL: {}",
                endpoint
            )));
        }

        if let (Some(min), Some(max)) = (self.min_loan_amount, self.max_loan_amount) {
            if min > max {
                return Err(Error::InvalidLender(format!(
                    "min_loan_amount {} exceeds max_loan_amount {}",
                    min, max
                )));
            }
        }

        if self.price_per_lead.is_sign_negative() {
            return Err(Error::InvalidLender(
                "price_per_lead cannot be negative".to_string(),
            ));
        }

        if self.auth_type == AuthType::Unknown {
            return Err(Error::InvalidLender("unsupported auth_type".to_string()));
        }

        if self.auth_type != AuthType::None
            && self.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            return Err(Error::InvalidLender(format!(
                "auth_type {:?} requires an api_key",
                self.auth_type
            )));
        }

        for blob in [&self.field_mapping, &self.custom_headers] {
            if !(blob.is_null() || blob.is_object()) {
                return Err(Error::InvalidLender(
                    "field_mapping and custom_headers must be JSON objects".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// `POST /lenders/:id/test` result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LenderTestResult {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub success: bool,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub status_code: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub response_time_ms: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub message: Option<String>,
    #[serde(default)]
    pub response: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input() -> LenderInput {
        LenderInput {
            name: "FiestaCredito".to_string(),
            api_endpoint: "https://api.fiesta.example/leads".to_string(),
            api_key: Some("sk_live_12345678".to_string()),
            auth_type: AuthType::Bearer,
            min_loan_amount: Some(dec!(100)),
            max_loan_amount: Some(dec!(5000)),
            price_per_lead: dec!(12.50),
            is_active: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_input() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_inverted_amount_band_rejected() {
        let mut bad = input();
        bad.min_loan_amount = Some(dec!(6000));
        assert!(matches!(bad.validate(), Err(Error::InvalidLender(_))));
    }

    #[test]
    fn test_auth_without_key_rejected() {
        let mut bad = input();
        bad.api_key = None;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_lender_parses_backend_strings() {
        let lender: Lender = serde_json::from_value(serde_json::json!({
            "id": "3",
            "name": "Moneyman",
            "auth_type": "api_key",
            "api_key": "abcdef123456",
            "min_loan_amount": "50.00",
            "max_loan_amount": "1000",
            "price_per_lead": "8.5",
            "priority": "2",
            "is_active": true,
            "accepted_loan_purposes": ["personal", "car"]
        }))
        .unwrap();

        assert_eq!(lender.id, 3);
        assert_eq!(lender.auth_type, AuthType::ApiKey);
        assert!(lender.accepts_amount(dec!(500)));
        assert!(!lender.accepts_amount(dec!(1500)));
        assert_eq!(lender.masked_api_key().as_deref(), Some("••••••••3456"));
    }

    #[test]
    fn test_lender_tolerates_nulls_and_unknown_auth() {
        let lenders: Vec<Lender> = serde_json::from_value(serde_json::json!([
            {"id": 1, "name": null, "auth_type": null, "is_active": null},
            {"id": 2, "name": "Vivus", "auth_type": "header", "is_active": "true"}
        ]))
        .unwrap();

        assert_eq!(lenders[0].name, "");
        assert_eq!(lenders[0].auth_type, AuthType::None);
        assert!(!lenders[0].is_active);
        assert_eq!(lenders[1].auth_type, AuthType::Unknown);
        assert!(lenders[1].is_active);
    }

    #[test]
    fn test_unknown_auth_type_rejected_on_input() {
        let mut bad = input();
        bad.auth_type = AuthType::Unknown;
        assert!(matches!(bad.validate(), Err(Error::InvalidLender(_))));
    }
}
