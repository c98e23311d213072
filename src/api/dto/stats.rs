//! Dashboard rollup DTOs.

use bigdecimal::BigDecimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::repositories::PlotsRow;
use crate::services::{DashboardStats, UnpaidFarmer};

#[derive(Debug, Serialize, ToSchema)]
pub struct PlotsSummaryRow {
    #[schema(example = "Block A")]
    pub block_name: String,
    #[schema(example = "Section 1")]
    pub section_name: String,
    pub total_plots: i64,
}

impl From<PlotsRow> for PlotsSummaryRow {
    fn from(row: PlotsRow) -> Self {
        Self {
            block_name: row.block_name,
            section_name: row.section_name,
            total_plots: row.total_plots,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnpaidFarmerResponse {
    pub id: i32,
    pub name: String,
    pub block: String,
    pub section: String,
    /// Total owed less everything paid
    #[schema(value_type = String)]
    pub outstanding: BigDecimal,
}

impl From<UnpaidFarmer> for UnpaidFarmerResponse {
    fn from(farmer: UnpaidFarmer) -> Self {
        Self {
            id: farmer.id,
            name: farmer.name,
            block: farmer.block,
            section: farmer.section,
            outstanding: farmer.outstanding,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    /// Active farmers
    pub total_farmers: i64,
    /// Percent, one decimal place
    #[schema(example = 62.5)]
    pub attendance_rate: f64,
    #[schema(value_type = String)]
    pub fines_collected: BigDecimal,
    pub plots_summary: Vec<PlotsSummaryRow>,
    /// At most five, largest balance first
    pub top_unpaid: Vec<UnpaidFarmerResponse>,
}

impl From<DashboardStats> for DashboardResponse {
    fn from(stats: DashboardStats) -> Self {
        Self {
            total_farmers: stats.total_farmers,
            attendance_rate: stats.attendance_rate,
            fines_collected: stats.fines_collected,
            plots_summary: stats.plots_summary.into_iter().map(Into::into).collect(),
            top_unpaid: stats.top_unpaid.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_shape() {
        let stats = DashboardStats {
            total_farmers: 2,
            attendance_rate: 37.5,
            fines_collected: BigDecimal::from(250),
            plots_summary: vec![PlotsRow {
                block_name: "Block A".to_string(),
                section_name: "Section 1".to_string(),
                total_plots: 5,
            }],
            top_unpaid: vec![UnpaidFarmer {
                id: 8,
                name: "Chisomo Mwale".to_string(),
                block: "Block A".to_string(),
                section: "Section 1".to_string(),
                outstanding: BigDecimal::from(700),
            }],
        };
        let body = serde_json::to_value(DashboardResponse::from(stats)).unwrap();

        assert_eq!(body["total_farmers"], 2);
        assert_eq!(body["attendance_rate"], 37.5);
        assert_eq!(body["plots_summary"][0]["total_plots"], 5);
        assert_eq!(body["top_unpaid"][0]["name"], "Chisomo Mwale");
        assert_eq!(body["top_unpaid"][0]["outstanding"], "700");
    }
}
