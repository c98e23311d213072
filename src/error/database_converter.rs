use crate::error::{AppError, ConstraintParser};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// Converts Diesel errors into structured `AppError` variants.
///
/// Violations of constraints this schema declares are reported as field-keyed
/// validation errors carrying a readable message; unknown constraints fall back
/// to what can be parsed out of the PostgreSQL message.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Converts a Diesel error to an appropriate AppError variant.
    ///
    /// # Arguments
    /// * `error` - The Diesel error to convert
    /// * `operation` - Description of the database operation that failed
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info.as_ref(), operation)
            }
            DieselError::NotFound => AppError::NotFound {
                entity: "resource".to_string(),
                field: "id".to_string(),
                value: "unknown".to_string(),
            },
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    fn convert_database_error(
        kind: DatabaseErrorKind,
        info: &(dyn DatabaseErrorInformation + Send + Sync),
        operation: &str,
    ) -> AppError {
        // The "Key (..)=(..)" part of a violation lives in the DETAIL line.
        let full_message = match info.details() {
            Some(details) => format!("{}\n{}", info.message(), details),
            None => info.message().to_string(),
        };
        let message = full_message.as_str();
        let constraint_name = info.constraint_name();

        if let Some(known) = ConstraintParser::known(constraint_name) {
            return AppError::Validation {
                field: known.field.to_string(),
                reason: known.message.to_string(),
            };
        }

        match kind {
            DatabaseErrorKind::UniqueViolation => {
                match ConstraintParser::parse_unique_violation(message, constraint_name) {
                    Some((entity, field, value)) => AppError::Duplicate { entity, field, value },
                    None => Self::unparsed(operation, "Unique constraint violation", message),
                }
            }
            DatabaseErrorKind::NotNullViolation => {
                match ConstraintParser::parse_not_null_violation(message, constraint_name) {
                    Some((entity, field)) => AppError::Validation {
                        field,
                        reason: format!("Field is required for {}", entity),
                    },
                    None => Self::unparsed(operation, "Not null constraint violation", message),
                }
            }
            DatabaseErrorKind::ForeignKeyViolation => {
                if ConstraintParser::is_still_referenced(message) {
                    let referencing = constraint_name
                        .and_then(ConstraintParser::parse_foreign_key_constraint_name)
                        .map(|(entity, _)| entity)
                        .unwrap_or_else(|| "other records".to_string());
                    return AppError::BadRequest {
                        message: format!("Cannot delete: record is referenced by {}.", referencing),
                    };
                }
                match ConstraintParser::parse_foreign_key_violation(message, constraint_name) {
                    Some((_, field, referenced_value)) => AppError::Validation {
                        reason: format!("Invalid pk \"{}\" - object does not exist.", referenced_value),
                        field: field.trim_end_matches("_id").to_string(),
                    },
                    None => Self::unparsed(operation, "Foreign key constraint violation", message),
                }
            }
            DatabaseErrorKind::CheckViolation => {
                match ConstraintParser::parse_check_violation(message, constraint_name) {
                    Some((entity, field)) => AppError::Validation {
                        field,
                        reason: format!("Check constraint failed for {} field", entity),
                    },
                    None => Self::unparsed(operation, "Check constraint violation", message),
                }
            }
            _ => Self::unparsed(operation, "Database error", message),
        }
    }

    fn unparsed(operation: &str, label: &str, message: &str) -> AppError {
        AppError::Database {
            operation: operation.to_string(),
            source: anyhow::Error::msg(format!("{}: {}", label, message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockDatabaseErrorInfo {
        message: String,
        details: Option<String>,
        constraint_name: Option<String>,
    }

    impl MockDatabaseErrorInfo {
        fn boxed(message: &str, constraint_name: Option<&str>) -> Box<Self> {
            Box::new(Self {
                message: message.to_string(),
                details: None,
                constraint_name: constraint_name.map(str::to_string),
            })
        }
    }

    impl DatabaseErrorInformation for MockDatabaseErrorInfo {
        fn message(&self) -> &str {
            &self.message
        }

        fn details(&self) -> Option<&str> {
            self.details.as_deref()
        }

        fn hint(&self) -> Option<&str> {
            None
        }

        fn table_name(&self) -> Option<&str> {
            None
        }

        fn column_name(&self) -> Option<&str> {
            None
        }

        fn constraint_name(&self) -> Option<&str> {
            self.constraint_name.as_deref()
        }

        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    #[test]
    fn test_convert_not_found_error() {
        let result = DatabaseErrorConverter::convert_diesel_error(DieselError::NotFound, "find farmer");
        assert!(matches!(result, AppError::NotFound { .. }));
    }

    #[test]
    fn test_duplicate_attendance_triple_is_validation_error() {
        let info = MockDatabaseErrorInfo::boxed(
            "duplicate key value violates unique constraint \"attendance_farmer_date_type_key\"",
            Some("attendance_farmer_date_type_key"),
        );
        let error = DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info);

        match DatabaseErrorConverter::convert_diesel_error(error, "insert attendance") {
            AppError::Validation { field, reason } => {
                assert_eq!(field, "non_field_errors");
                assert!(reason.contains("already been recorded"));
            }
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[test]
    fn test_second_active_chairperson_is_rejected_on_role() {
        let info = MockDatabaseErrorInfo::boxed(
            "duplicate key value violates unique constraint \"farmers_one_active_chair_per_block\"",
            Some("farmers_one_active_chair_per_block"),
        );
        let error = DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info);

        match DatabaseErrorConverter::convert_diesel_error(error, "insert farmer") {
            AppError::Validation { field, .. } => assert_eq!(field, "role"),
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_unique_violation_becomes_duplicate() {
        let info = MockDatabaseErrorInfo::boxed(
            "duplicate key value violates unique constraint \"users_email_key\"\nDETAIL: Key (email)=(a@b.mw) already exists.",
            Some("users_email_key"),
        );
        let error = DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info);

        match DatabaseErrorConverter::convert_diesel_error(error, "insert user") {
            AppError::Duplicate { entity, field, value } => {
                assert_eq!(entity, "users");
                assert_eq!(field, "email");
                assert_eq!(value, "a@b.mw");
            }
            other => panic!("Expected Duplicate error, got: {:?}", other),
        }
    }

    #[test]
    fn test_convert_not_null_violation() {
        let info = MockDatabaseErrorInfo::boxed(
            "null value in column \"first_name\" of relation \"farmers\" violates not-null constraint",
            None,
        );
        let error = DieselError::DatabaseError(DatabaseErrorKind::NotNullViolation, info);

        match DatabaseErrorConverter::convert_diesel_error(error, "insert farmer") {
            AppError::Validation { field, reason } => {
                assert_eq!(field, "first_name");
                assert!(reason.contains("required"));
            }
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[test]
    fn test_missing_farmer_reference_is_field_error() {
        let info = Box::new(MockDatabaseErrorInfo {
            message: "insert or update on table \"payments\" violates foreign key constraint \"payments_farmer_id_fkey\"".to_string(),
            details: Some("Key (farmer_id)=(999) is not present in table \"farmers\".".to_string()),
            constraint_name: Some("payments_farmer_id_fkey".to_string()),
        });
        let error = DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info);

        match DatabaseErrorConverter::convert_diesel_error(error, "insert payment") {
            AppError::Validation { field, reason } => {
                assert_eq!(field, "farmer");
                assert!(reason.contains("999"));
            }
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[test]
    fn test_deleting_referenced_farmer_is_bad_request() {
        let info = Box::new(MockDatabaseErrorInfo {
            message: "update or delete on table \"farmers\" violates foreign key constraint \"payments_farmer_id_fkey\" on table \"payments\"".to_string(),
            details: Some("Key (id)=(3) is still referenced from table \"payments\".".to_string()),
            constraint_name: Some("payments_farmer_id_fkey".to_string()),
        });
        let error = DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info);

        match DatabaseErrorConverter::convert_diesel_error(error, "delete farmer") {
            AppError::BadRequest { message } => assert!(message.contains("payments")),
            other => panic!("Expected BadRequest error, got: {:?}", other),
        }
    }

    #[test]
    fn test_unparsed_error_keeps_operation() {
        let info = MockDatabaseErrorInfo::boxed("deadlock detected", None);
        let error = DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, info);

        match DatabaseErrorConverter::convert_diesel_error(error, "verify payment") {
            AppError::Database { operation, .. } => assert_eq!(operation, "verify payment"),
            other => panic!("Expected Database error, got: {:?}", other),
        }
    }
}
