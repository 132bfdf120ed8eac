//! Nearest-time price lookup.

use chrono::NaiveDate;
use fxledger_core::Commodity;
use rust_decimal::Decimal;

use crate::series::{PriceAlist, PricePoint};

/// Price of the point closest in time to `date`.
///
/// `points` must be sorted ascending by date. The candidates are the last
/// point on or before `date` and the first point after it; the earlier one
/// wins only when strictly closer, so equal distances go to the later point.
/// Returns `None` for an empty series.
///
/// ```
/// use chrono::NaiveDate;
/// use fxledger_rates::lookup::nearest;
/// use fxledger_rates::series::PricePoint;
/// use rust_decimal_macros::dec;
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
/// let points = [PricePoint::new(d(10), dec!(100)), PricePoint::new(d(20), dec!(200))];
/// assert_eq!(nearest(&points, d(14)), Some(dec!(100)));
/// assert_eq!(nearest(&points, d(15)), Some(dec!(200)));
/// ```
#[must_use]
pub fn nearest(points: &[PricePoint], date: NaiveDate) -> Option<Decimal> {
    let split = points.partition_point(|p| p.date <= date);
    let earlier = split.checked_sub(1).map(|i| &points[i]);
    let later = points.get(split);

    match (earlier, later) {
        (Some(e), Some(l)) => {
            if date - e.date < l.date - date {
                Some(e.price)
            } else {
                Some(l.price)
            }
        }
        (Some(only), None) | (None, Some(only)) => Some(only.price),
        (None, None) => None,
    }
}

/// Nearest price of `commodity` in `alist`, or zero when the commodity has no
/// series or an empty one.
#[must_use]
pub fn nearest_in_alist(alist: &PriceAlist, commodity: &Commodity, date: NaiveDate) -> Decimal {
    alist
        .get(commodity)
        .and_then(|list| nearest(&list.points, date))
        .unwrap_or(Decimal::ZERO)
}
