//! Products created per month of the current year.

use super::polyline_points;

/// Line chart of product creation per month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductsChart {
    pub heading: &'static str,
    pub dataset_label: &'static str,
    /// `"01"` to `"12"`.
    pub labels: Vec<String>,
    /// Product count per month, January first.
    pub data: Vec<i64>,
}

impl ProductsChart {
    /// Build the twelve-month series from `(month, count)` pairs.
    ///
    /// Months outside 1-12 are ignored; missing months count zero.
    #[must_use]
    pub fn from_monthly_counts(counts: &[(i32, i64)]) -> Self {
        let mut data = vec![0; 12];
        for &(month, count) in counts {
            if let Some(slot) = usize::try_from(month - 1).ok().and_then(|i| data.get_mut(i)) {
                *slot += count;
            }
        }
        Self {
            heading: "Products Chart",
            dataset_label: "Product",
            labels: (1..=12).map(|m| format!("{m:02}")).collect(),
            data,
        }
    }

    /// Points for the line, in a 600 x 200 viewbox.
    #[must_use]
    pub fn points(&self) -> String {
        polyline_points(&self.data, 600.0, 200.0)
    }

    /// Largest monthly count, for the axis label.
    #[must_use]
    pub fn max(&self) -> i64 {
        self.data.iter().copied().max().unwrap_or(0)
    }
}
