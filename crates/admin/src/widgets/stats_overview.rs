//! Headline counts with illustrative sparklines.

use super::polyline_points;

/// Accent color of a stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatColor {
    Success,
    Danger,
}

impl StatColor {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Danger => "danger",
        }
    }
}

/// One stat card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
    pub label: &'static str,
    pub value: i64,
    pub description: &'static str,
    /// Heroicon name.
    pub description_icon: &'static str,
    pub color: StatColor,
    /// Static trend shape; not derived from data.
    pub chart: &'static [i64],
}

impl Stat {
    /// Sparkline points for a small inline SVG.
    #[must_use]
    pub fn sparkline(&self) -> String {
        polyline_points(self.chart, 120.0, 24.0)
    }
}

/// The three overview stats: customers, products and pending orders.
#[must_use]
pub fn stats(customers: i64, products: i64, pending_orders: i64) -> Vec<Stat> {
    vec![
        Stat {
            label: "Total Customers",
            value: customers,
            description: "Increase in customers",
            description_icon: "arrow-trending-up",
            color: StatColor::Success,
            chart: &[2, 3, 1, 2, 3, 2, 1, 2],
        },
        Stat {
            label: "Total Products",
            value: products,
            description: "Total products in app",
            description_icon: "arrow-trending-down",
            color: StatColor::Danger,
            chart: &[2, 3, 4, 2, 1, 0, 1, 2],
        },
        Stat {
            label: "Pending Orders",
            value: pending_orders,
            description: "Total orders in app",
            description_icon: "arrow-trending-down",
            color: StatColor::Danger,
            chart: &[2, 3, 4, 2, 5, 0, 3, 2],
        },
    ]
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_order_and_values() {
        let stats = stats(12, 40, 3);
        let labels: Vec<&str> = stats.iter().map(|s| s.label).collect();
        assert_eq!(labels, ["Total Customers", "Total Products", "Pending Orders"]);
        assert_eq!(stats[0].value, 12);
        assert_eq!(stats[2].value, 3);
        assert_eq!(stats[0].color, StatColor::Success);
        assert_eq!(stats[1].color.as_str(), "danger");
    }

    #[test]
    fn test_sparkline_has_a_point_per_value() {
        let stats = stats(0, 0, 0);
        assert_eq!(stats[2].sparkline().split(' ').count(), 8);
    }
}
