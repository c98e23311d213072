use std::str::FromStr;

/// A listing order parsed from `?ordering=field` or `?ordering=-field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<K> {
    pub key: K,
    pub descending: bool,
}

impl<K: FromStr> Sort<K> {
    /// Parses `raw`, falling back to `default` when it is absent or names an
    /// unknown field.
    pub fn parse_or(raw: Option<&str>, default: Sort<K>) -> Sort<K> {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            return default;
        };
        let (descending, name) = match raw.strip_prefix('-') {
            Some(name) => (true, name),
            None => (false, raw),
        };
        match name.parse::<K>() {
            Ok(key) => Sort { key, descending },
            Err(_) => default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSortKey {
    DateReported,
    Severity,
    PenaltyPoints,
}

impl FromStr for CaseSortKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date_reported" => Ok(CaseSortKey::DateReported),
            "severity" => Ok(CaseSortKey::Severity),
            "penalty_points" => Ok(CaseSortKey::PenaltyPoints),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentSortKey {
    DatePaid,
    Amount,
    Timestamp,
}

impl FromStr for PaymentSortKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date_paid" => Ok(PaymentSortKey::DatePaid),
            "amount" => Ok(PaymentSortKey::Amount),
            "timestamp" => Ok(PaymentSortKey::Timestamp),
            _ => Err(()),
        }
    }
}
