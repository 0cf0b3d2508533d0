//! Template taxonomy
//!
//! Closed set of (type, subtype) pairs a notification template may carry.
//! Client-facing templates cover billing flows; employee-facing templates
//! cover payout flows. Anything outside this mapping is rejected before
//! it reaches storage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Audience a template is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum TemplateType {
    Clients,
    Employees,
}

/// Concrete notification flow within an audience
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum TemplateSubtype {
    RecurringCharge,
    OneTimeCharge,
    PaymentReminder,
    Contract,
    InvoiceRequest,
    HoursReport,
}

impl TemplateType {
    pub fn as_str(self) -> &'static str {
        match self {
            TemplateType::Clients => "clients",
            TemplateType::Employees => "employees",
        }
    }

    /// Whether this type permits the given subtype
    pub fn allows(self, subtype: TemplateSubtype) -> bool {
        match self {
            TemplateType::Clients => matches!(
                subtype,
                TemplateSubtype::RecurringCharge
                    | TemplateSubtype::OneTimeCharge
                    | TemplateSubtype::PaymentReminder
                    | TemplateSubtype::Contract
            ),
            TemplateType::Employees => matches!(
                subtype,
                TemplateSubtype::InvoiceRequest | TemplateSubtype::HoursReport
            ),
        }
    }
}

impl TemplateSubtype {
    pub fn as_str(self) -> &'static str {
        match self {
            TemplateSubtype::RecurringCharge => "recurring-charge",
            TemplateSubtype::OneTimeCharge => "one-time-charge",
            TemplateSubtype::PaymentReminder => "payment-reminder",
            TemplateSubtype::Contract => "contract",
            TemplateSubtype::InvoiceRequest => "invoice-request",
            TemplateSubtype::HoursReport => "hours-report",
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TemplateSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clients" => Ok(TemplateType::Clients),
            "employees" => Ok(TemplateType::Employees),
            other => Err(format!("Unknown template type '{}'", other)),
        }
    }
}

impl FromStr for TemplateSubtype {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recurring-charge" => Ok(TemplateSubtype::RecurringCharge),
            "one-time-charge" => Ok(TemplateSubtype::OneTimeCharge),
            "payment-reminder" => Ok(TemplateSubtype::PaymentReminder),
            "contract" => Ok(TemplateSubtype::Contract),
            "invoice-request" => Ok(TemplateSubtype::InvoiceRequest),
            "hours-report" => Ok(TemplateSubtype::HoursReport),
            other => Err(format!("Unknown template subtype '{}'", other)),
        }
    }
}

/// Validate a (type, subtype) pair against the closed mapping
pub fn is_valid_pair(template_type: TemplateType, subtype: TemplateSubtype) -> bool {
    template_type.allows(subtype)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_pairs_valid() {
        assert!(is_valid_pair(
            TemplateType::Clients,
            TemplateSubtype::RecurringCharge
        ));
        assert!(is_valid_pair(
            TemplateType::Clients,
            TemplateSubtype::OneTimeCharge
        ));
        assert!(is_valid_pair(
            TemplateType::Clients,
            TemplateSubtype::PaymentReminder
        ));
        assert!(is_valid_pair(TemplateType::Clients, TemplateSubtype::Contract));
    }

    #[test]
    fn test_employee_pairs_valid() {
        assert!(is_valid_pair(
            TemplateType::Employees,
            TemplateSubtype::InvoiceRequest
        ));
        assert!(is_valid_pair(
            TemplateType::Employees,
            TemplateSubtype::HoursReport
        ));
    }

    #[test]
    fn test_cross_audience_pairs_rejected() {
        // Employee-only subtype on the client type
        assert!(!is_valid_pair(
            TemplateType::Clients,
            TemplateSubtype::InvoiceRequest
        ));
        assert!(!is_valid_pair(
            TemplateType::Clients,
            TemplateSubtype::HoursReport
        ));
        assert!(!is_valid_pair(
            TemplateType::Employees,
            TemplateSubtype::RecurringCharge
        ));
        assert!(!is_valid_pair(
            TemplateType::Employees,
            TemplateSubtype::Contract
        ));
    }

    #[test]
    fn test_parse_wire_names() {
        assert_eq!("clients".parse::<TemplateType>().unwrap(), TemplateType::Clients);
        assert_eq!(
            "payment-reminder".parse::<TemplateSubtype>().unwrap(),
            TemplateSubtype::PaymentReminder
        );
        assert!("vendors".parse::<TemplateType>().is_err());
        assert!("bonus".parse::<TemplateSubtype>().is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let json = serde_json::to_string(&TemplateSubtype::InvoiceRequest).unwrap();
        assert_eq!(json, "\"invoice-request\"");
        let back: TemplateSubtype = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TemplateSubtype::InvoiceRequest);
    }
}
