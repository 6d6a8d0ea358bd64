use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BestSeller {
    pub id: i64,
    pub nama_produk: String,
    pub image: Option<String>,
    pub total_qty: i64,
    pub total_revenue: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub total_revenue: i64,
    pub today_revenue: i64,
    pub yesterday_revenue: i64,
    /// Day-over-day change in percent, two decimals
    pub percentage_change: f64,
    pub best_seller: Option<BestSeller>,
}

/// Day-over-day change in percent. A zero baseline reports 100 when
/// today has any revenue.
pub fn percentage_change(today: i64, yesterday: i64) -> f64 {
    if yesterday == 0 {
        return if today > 0 { 100.0 } else { 0.0 };
    }
    let raw = (today - yesterday) as f64 / yesterday as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_change() {
        assert_eq!(percentage_change(150, 100), 50.0);
        assert_eq!(percentage_change(50, 100), -50.0);
        assert_eq!(percentage_change(100, 100), 0.0);
        assert_eq!(percentage_change(1, 3), -66.67);
        assert_eq!(percentage_change(2, 3), -33.33);
    }

    #[test]
    fn test_percentage_change_zero_baseline() {
        assert_eq!(percentage_change(0, 0), 0.0);
        assert_eq!(percentage_change(5000, 0), 100.0);
    }

    #[test]
    fn test_report_wire_format() {
        let report = SalesReport {
            total_revenue: 10,
            today_revenue: 3,
            yesterday_revenue: 0,
            percentage_change: 100.0,
            best_seller: None,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["totalRevenue"], 10);
        assert_eq!(value["percentageChange"], 100.0);
        assert!(value["bestSeller"].is_null());
    }
}
