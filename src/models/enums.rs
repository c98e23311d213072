//! Closed vocabularies stored as VARCHAR columns.
//!
//! Every enum maps to and from its snake_case database value through
//! `ToSql/FromSql<Text, Pg>`, serializes to the same string, and carries the
//! human label shown by the front end.

use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use std::io::Write;

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident : $column:literal {
            $($variant:ident => ($value:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            Serialize,
            Deserialize,
            utoipa::ToSchema,
            diesel::AsExpression,
            diesel::FromSqlRow,
        )]
        #[diesel(sql_type = Text)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    _ => Err(format!("\"{}\" is not a valid choice for {}.", s, $column)),
                }
            }
        }

        impl ToSql<Text, Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(self.as_str().as_bytes())?;
                Ok(serialize::IsNull::No)
            }
        }

        impl FromSql<Text, Pg> for $name {
            fn from_sql(
                bytes: <Pg as diesel::backend::Backend>::RawValue<'_>,
            ) -> deserialize::Result<Self> {
                let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
                s.parse::<$name>().map_err(Into::into)
            }
        }
    };
}

text_enum! {
    /// Role of an authenticated user account.
    Role: "role" {
        Farmer => ("farmer", "Farmer"),
        BlockChair => ("block_chair", "Block Chair"),
        President => ("president", "President"),
        Admin => ("admin", "Admin"),
        Treasurer => ("treasurer", "Treasurer"),
        Secretary => ("secretary", "Secretary"),
    }
}

text_enum! {
    Gender: "gender" {
        Male => ("male", "Male"),
        Female => ("female", "Female"),
        Other => ("other", "Other"),
    }
}

text_enum! {
    /// Position a farmer holds within the scheme (distinct from a user role).
    FarmerRole: "role" {
        Farmer => ("farmer", "Farmer"),
        Chairperson => ("chairperson", "Block Chairperson"),
        President => ("president", "President"),
    }
}

text_enum! {
    AttendanceType: "attendance_type" {
        GeneralAssembly => ("general_assembly", "General Assembly"),
        MainCanalCleaning => ("main_canal_cleaning", "Main Canal Cleaning"),
        BlockCanalCleaning => ("block_canal_cleaning", "Block Canal Cleaning"),
        Training => ("training", "Training"),
        FieldInspection => ("field_inspection", "Field Inspection"),
    }
}

text_enum! {
    AttendanceStatus: "status" {
        Present => ("present", "Present"),
        Absent => ("absent", "Absent"),
        Late => ("late", "Late"),
        Excused => ("excused", "Excused (With Reason)"),
    }
}

text_enum! {
    OffenceType: "offence_type" {
        Absence => ("absence", "Absence"),
        Lateness => ("lateness", "Lateness"),
        Violence => ("violence", "Violence"),
        Theft => ("theft", "Theft"),
        Vandalism => ("vandalism", "Vandalism"),
        NonCompliance => ("non_compliance", "Non-compliance"),
        Other => ("other", "Other"),
    }
}

text_enum! {
    /// Lifecycle state of a discipline case.
    CaseStatus: "status" {
        Open => ("open", "Open"),
        Investigating => ("investigating", "Investigating"),
        HearingScheduled => ("hearing_scheduled", "Hearing Scheduled"),
        Resolved => ("resolved", "Resolved"),
        Closed => ("closed", "Closed"),
        Appealed => ("appealed", "Appealed"),
    }
}

text_enum! {
    Severity: "severity" {
        Minor => ("minor", "Minor"),
        Moderate => ("moderate", "Moderate"),
        Serious => ("serious", "Serious"),
        Critical => ("critical", "Critical"),
    }
}

text_enum! {
    PaymentType: "payment_type" {
        PlotFee => ("plot_fee", "Plot Fee"),
        Fine => ("fine", "Fine"),
        Contribution => ("contribution", "Scheme Contribution"),
        Other => ("other", "Other"),
    }
}

text_enum! {
    PaymentMethod: "method" {
        Cash => ("cash", "Cash"),
        Airtel => ("airtel", "Airtel Money"),
        Tnm => ("tnm", "TNM Mpamba"),
        Bank => ("bank", "Bank Transfer"),
        Other => ("other", "Other"),
    }
}

impl Default for CaseStatus {
    fn default() -> Self {
        CaseStatus::Open
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Moderate
    }
}

impl Default for PaymentType {
    fn default() -> Self {
        PaymentType::PlotFee
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

impl Default for FarmerRole {
    fn default() -> Self {
        FarmerRole::Farmer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_values_round_trip_through_from_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), *role);
        }
        for status in CaseStatus::ALL {
            assert_eq!(status.to_string().parse::<CaseStatus>().unwrap(), *status);
        }
    }

    #[test]
    fn test_serde_uses_database_values() {
        assert_eq!(serde_json::to_string(&Role::BlockChair).unwrap(), "\"block_chair\"");
        assert_eq!(
            serde_json::from_str::<AttendanceType>("\"block_canal_cleaning\"").unwrap(),
            AttendanceType::BlockCanalCleaning
        );
        assert_eq!(
            serde_json::to_string(&CaseStatus::HearingScheduled).unwrap(),
            "\"hearing_scheduled\""
        );
    }

    #[test]
    fn test_unknown_value_is_rejected_with_column_name() {
        let err = "wire".parse::<PaymentMethod>().unwrap_err();
        assert!(err.contains("method"));
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_labels() {
        assert_eq!(PaymentMethod::Tnm.label(), "TNM Mpamba");
        assert_eq!(FarmerRole::Chairperson.label(), "Block Chairperson");
    }
}
