//! Export sanitization for numeric columns.
//!
//! Non-finite numbers never leave the process: they become absent (empty
//! field), not zero. The spreadsheet mirror additionally drops magnitudes
//! above [`SHEET_MAX_MAGNITUDE`].

use crate::domain::Row;

/// Largest magnitude written to a spreadsheet cell.
pub const SHEET_MAX_MAGNITUDE: f64 = 1e100;

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn sheet_safe(value: Option<f64>) -> Option<f64> {
    finite(value).filter(|v| v.abs() <= SHEET_MAX_MAGNITUDE)
}

/// Replace ±inf and NaN with absent in every numeric column.
pub fn sanitize(row: &Row) -> Row {
    Row {
        value: finite(row.value),
        prev_close: finite(row.prev_close),
        change_pct: finite(row.change_pct),
        ..row.clone()
    }
}

/// [`sanitize`], plus absent for magnitudes over 1e100.
pub fn sanitize_for_sheet(row: &Row) -> Row {
    Row {
        value: sheet_safe(row.value),
        prev_close: sheet_safe(row.prev_close),
        change_pct: sheet_safe(row.change_pct),
        ..row.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use proptest::prelude::*;

    fn row(value: Option<f64>, prev_close: Option<f64>, change_pct: Option<f64>) -> Row {
        Row {
            timestamp_utc: "2024-05-01T00:00:00.000000+00:00".into(),
            category: Category::IndexFxCommodity,
            name: "EUR/USD".into(),
            symbol: "EURUSD=X".into(),
            value,
            prev_close,
            change_pct,
            unit: String::new(),
            source: "yfinance".into(),
        }
    }

    #[test]
    fn non_finite_becomes_absent_not_zero() {
        let r = sanitize(&row(Some(f64::NAN), Some(f64::INFINITY), Some(f64::NEG_INFINITY)));
        assert_eq!(r.value, None);
        assert_eq!(r.prev_close, None);
        assert_eq!(r.change_pct, None);
    }

    #[test]
    fn file_sanitizer_keeps_huge_finite_values() {
        let r = sanitize(&row(Some(1e150), Some(1.0), None));
        assert_eq!(r.value, Some(1e150));
    }

    #[test]
    fn sheet_sanitizer_drops_huge_values() {
        let r = sanitize_for_sheet(&row(Some(1e150), Some(-2e101), Some(1e100)));
        assert_eq!(r.value, None);
        assert_eq!(r.prev_close, None);
        assert_eq!(r.change_pct, Some(1e100));
    }

    #[test]
    fn text_columns_untouched() {
        let original = row(Some(f64::NAN), None, None);
        let r = sanitize(&original);
        assert_eq!(r.name, original.name);
        assert_eq!(r.source, original.source);
        assert_eq!(r.timestamp_utc, original.timestamp_utc);
    }

    fn any_number() -> impl Strategy<Value = Option<f64>> {
        prop_oneof![
            Just(None),
            Just(Some(f64::NAN)),
            Just(Some(f64::INFINITY)),
            Just(Some(f64::NEG_INFINITY)),
            Just(Some(1e200)),
            Just(Some(-1e101)),
            any::<f64>().prop_map(Some),
            (-1e6f64..1e6).prop_map(Some),
        ]
    }

    proptest! {
        #[test]
        fn sanitize_is_idempotent(v in any_number(), p in any_number(), c in any_number()) {
            let once = sanitize(&row(v, p, c));
            let twice = sanitize(&once);
            prop_assert_eq!(&once, &twice);
            for x in [once.value, once.prev_close, once.change_pct].into_iter().flatten() {
                prop_assert!(x.is_finite());
            }
        }

        #[test]
        fn sheet_sanitize_is_idempotent(v in any_number(), p in any_number(), c in any_number()) {
            let once = sanitize_for_sheet(&row(v, p, c));
            let twice = sanitize_for_sheet(&once);
            prop_assert_eq!(&once, &twice);
            for x in [once.value, once.prev_close, once.change_pct].into_iter().flatten() {
                prop_assert!(x.is_finite());
                prop_assert!(x.abs() <= SHEET_MAX_MAGNITUDE);
            }
        }
    }
}
