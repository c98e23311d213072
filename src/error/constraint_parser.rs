use std::sync::LazyLock;

use regex::Regex;

/// Utility for parsing PostgreSQL constraint violation messages.
///
/// Known constraints of this schema are resolved through a fixed table into a
/// field name and a human message. Anything else falls back to the generic
/// `<table>_<column>_<suffix>` naming heuristics and the `Key (..)=(..)` detail.
pub struct ConstraintParser;

/// A schema constraint with the field and message reported to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownConstraint {
    pub name: &'static str,
    pub field: &'static str,
    pub message: &'static str,
}

const KNOWN_CONSTRAINTS: &[KnownConstraint] = &[
    KnownConstraint {
        name: "farmers_phone_number_key",
        field: "phone_number",
        message: "A farmer with this phone number already exists.",
    },
    KnownConstraint {
        name: "farmers_registration_number_key",
        field: "registration_number",
        message: "This registration number is already assigned.",
    },
    KnownConstraint {
        name: "farmers_one_active_chair_per_block",
        field: "role",
        message: "There is already an active chairperson for this block.",
    },
    KnownConstraint {
        name: "farmers_number_of_plots_check",
        field: "number_of_plots",
        message: "Ensure this value is greater than or equal to 1.",
    },
    KnownConstraint {
        name: "attendance_farmer_date_type_key",
        field: "non_field_errors",
        message: "Attendance for this farmer, date and type has already been recorded.",
    },
    KnownConstraint {
        name: "users_username_key",
        field: "username",
        message: "A user with that username already exists.",
    },
    KnownConstraint {
        name: "locations_name_key",
        field: "name",
        message: "A location with this name already exists.",
    },
    KnownConstraint {
        name: "blocks_name_key",
        field: "name",
        message: "A block with this name already exists.",
    },
    KnownConstraint {
        name: "sections_name_block_id_key",
        field: "name",
        message: "This block already has a section with this name.",
    },
    KnownConstraint {
        name: "blocks_chair_id_key",
        field: "block",
        message: "This user is already the designated chair of another block.",
    },
    KnownConstraint {
        name: "payments_amount_check",
        field: "amount",
        message: "Amount must be greater than zero.",
    },
];

// Matches "Key (field)=(value)" in PostgreSQL detail messages
static KEY_VALUE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Key \(([^)]+)\)=\(([^)]*)\)").ok());
static COLUMN_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"column "([^"]+)""#).ok());
static TABLE_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(?:table|relation) "([^"]+)""#).ok());

impl ConstraintParser {
    /// Looks up a constraint of this schema by name.
    pub fn known(constraint_name: Option<&str>) -> Option<&'static KnownConstraint> {
        let name = constraint_name?;
        KNOWN_CONSTRAINTS.iter().find(|known| known.name == name)
    }

    /// Parses a unique constraint violation into (entity, field, value).
    ///
    /// ```
    /// use scheme_rs::error::ConstraintParser;
    ///
    /// let message = "duplicate key value violates unique constraint \"users_email_key\"\nDETAIL: Key (email)=(a@b.mw) already exists.";
    /// let result = ConstraintParser::parse_unique_violation(message, Some("users_email_key"));
    /// assert_eq!(result, Some(("users".to_string(), "email".to_string(), "a@b.mw".to_string())));
    /// ```
    pub fn parse_unique_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String, String)> {
        if let Some((entity, field)) = constraint_name.and_then(Self::parse_constraint_name) {
            let value = Self::extract_key_value_from_message(message)
                .map(|(_, value)| value)
                .unwrap_or_else(|| "duplicate_value".to_string());
            return Some((entity, field, value));
        }

        let (field, value) = Self::extract_key_value_from_message(message)?;
        let entity = Self::extract_table_from_message(message).unwrap_or_else(|| "resource".to_string());
        Some((entity, field, value))
    }

    /// Parses a not-null violation into (entity, field).
    pub fn parse_not_null_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String)> {
        let field = Self::extract_column_from_message(message)?;
        let entity = Self::extract_table_from_message(message)
            .or_else(|| constraint_name.and_then(Self::parse_constraint_name).map(|(e, _)| e))
            .unwrap_or_else(|| "resource".to_string());
        Some((entity, field))
    }

    /// Parses a foreign key violation into (entity, field, referenced value).
    pub fn parse_foreign_key_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String, String)> {
        if let Some((entity, field)) =
            constraint_name.and_then(Self::parse_foreign_key_constraint_name)
        {
            let value = Self::extract_key_value_from_message(message)
                .map(|(_, value)| value)
                .unwrap_or_else(|| "invalid_reference".to_string());
            return Some((entity, field, value));
        }

        let (field, value) = Self::extract_key_value_from_message(message)?;
        let entity = Self::extract_table_from_message(message).unwrap_or_else(|| "resource".to_string());
        Some((entity, field, value))
    }

    /// Parses a check violation into (entity, field).
    pub fn parse_check_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String)> {
        if let Some(parsed) = constraint_name.and_then(Self::parse_constraint_name) {
            return Some(parsed);
        }
        let field = Self::extract_column_from_message(message)?;
        let entity = Self::extract_table_from_message(message).unwrap_or_else(|| "resource".to_string());
        Some((entity, field))
    }

    /// Splits `<table>_<column..>_<suffix>` into (table, column).
    ///
    /// - "users_username_key" -> ("users", "username")
    /// - "farmers_phone_number_key" -> ("farmers", "phone_number")
    pub fn parse_constraint_name(constraint_name: &str) -> Option<(String, String)> {
        let (rest, _suffix) = constraint_name.rsplit_once('_')?;
        let (entity, field) = rest.split_once('_')?;
        if entity.is_empty() || field.is_empty() {
            return None;
        }
        Some((entity.to_string(), field.to_string()))
    }

    /// Handles "payments_farmer_id_fkey" -> ("payments", "farmer_id").
    pub fn parse_foreign_key_constraint_name(constraint_name: &str) -> Option<(String, String)> {
        let without_suffix = constraint_name.strip_suffix("_fkey")?;
        let (entity, field) = without_suffix.split_once('_')?;
        if entity.is_empty() || field.is_empty() {
            return None;
        }
        Some((entity.to_string(), field.to_string()))
    }

    pub fn extract_key_value_from_message(message: &str) -> Option<(String, String)> {
        let captures = KEY_VALUE.as_ref()?.captures(message)?;
        Some((captures.get(1)?.as_str().to_string(), captures.get(2)?.as_str().to_string()))
    }

    pub fn extract_column_from_message(message: &str) -> Option<String> {
        let captures = COLUMN_NAME.as_ref()?.captures(message)?;
        Some(captures.get(1)?.as_str().to_string())
    }

    pub fn extract_table_from_message(message: &str) -> Option<String> {
        let captures = TABLE_NAME.as_ref()?.captures(message)?;
        Some(captures.get(1)?.as_str().to_string())
    }

    /// True when a foreign key violation was raised by deleting a referenced row.
    pub fn is_still_referenced(message: &str) -> bool {
        message.contains("is still referenced")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_constraint_lookup() {
        let known = ConstraintParser::known(Some("attendance_farmer_date_type_key")).unwrap();
        assert_eq!(known.field, "non_field_errors");

        let chair = ConstraintParser::known(Some("farmers_one_active_chair_per_block")).unwrap();
        assert_eq!(chair.field, "role");

        assert!(ConstraintParser::known(Some("unknown_thing_key")).is_none());
        assert!(ConstraintParser::known(None).is_none());
    }

    #[test]
    fn test_parse_constraint_name_keeps_multi_part_columns() {
        assert_eq!(
            ConstraintParser::parse_constraint_name("farmers_phone_number_key"),
            Some(("farmers".to_string(), "phone_number".to_string()))
        );
        assert_eq!(
            ConstraintParser::parse_constraint_name("users_username_key"),
            Some(("users".to_string(), "username".to_string()))
        );
        assert_eq!(ConstraintParser::parse_constraint_name("pkey"), None);
    }

    #[test]
    fn test_parse_foreign_key_constraint_name() {
        assert_eq!(
            ConstraintParser::parse_foreign_key_constraint_name("payments_farmer_id_fkey"),
            Some(("payments".to_string(), "farmer_id".to_string()))
        );
        assert_eq!(ConstraintParser::parse_foreign_key_constraint_name("payments_farmer_id"), None);
    }

    #[test]
    fn test_extract_key_value_from_message() {
        let message = "duplicate key value violates unique constraint \"farmers_phone_number_key\"\nDETAIL: Key (phone_number)=(+265991234567) already exists.";
        assert_eq!(
            ConstraintParser::extract_key_value_from_message(message),
            Some(("phone_number".to_string(), "+265991234567".to_string()))
        );
    }

    #[test]
    fn test_extract_column_and_table() {
        let message = "null value in column \"first_name\" of relation \"farmers\" violates not-null constraint";
        assert_eq!(
            ConstraintParser::extract_column_from_message(message),
            Some("first_name".to_string())
        );
        assert_eq!(
            ConstraintParser::extract_table_from_message(message),
            Some("farmers".to_string())
        );
    }

    #[test]
    fn test_is_still_referenced() {
        let message = "update or delete on table \"farmers\" violates foreign key constraint \"payments_farmer_id_fkey\" on table \"payments\"\nDETAIL: Key (id)=(3) is still referenced from table \"payments\".";
        assert!(ConstraintParser::is_still_referenced(message));
        assert!(!ConstraintParser::is_still_referenced("Key (farmer_id)=(9) is not present in table \"farmers\"."));
    }
}
