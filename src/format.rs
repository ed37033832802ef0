//! Display helpers: peso amounts, dates and month labels.

use std::sync::OnceLock;

use chrono::NaiveDate;
use numfmt::{Formatter, Precision, Scales};

use crate::models::MonthKey;

/// Language used for month names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    /// Spanish, e.g. `marzo de 2024`.
    #[default]
    Spanish,
    /// English, e.g. `March 2024`.
    English,
}

impl Locale {
    /// The chrono locale whose month names are used.
    const fn chrono(self) -> chrono::Locale {
        match self {
            Self::Spanish => chrono::Locale::es_MX,
            Self::English => chrono::Locale::en_US,
        }
    }
}

/// Human-readable label for a month.
///
/// Falls back to `YYYY-MM` for years chrono cannot represent.
#[inline]
#[must_use]
pub fn month_label(key: MonthKey, locale: Locale) -> String {
    let Some(first) = NaiveDate::from_ymd_opt(key.year(), key.month(), 1) else {
        return key.to_string();
    };
    let pattern = match locale {
        Locale::Spanish => "%B de %Y",
        Locale::English => "%B %Y",
    };
    first.format_localized(pattern, locale.chrono()).to_string()
}

/// Long Spanish date, e.g. `15 de enero de 2024`.
#[inline]
#[must_use]
pub fn format_long_date(date: NaiveDate) -> String {
    date.format_localized("%-d de %B de %Y", Locale::Spanish.chrono())
        .to_string()
}

/// Currency formatter for `prefix`, built once per cell.
fn currency_formatter(
    cell: &'static OnceLock<Option<Formatter>>,
    prefix: &str,
) -> Option<&'static Formatter> {
    cell.get_or_init(|| {
        Formatter::currency(prefix).ok().map(|fmt| {
            fmt.scales(Scales::none())
                .precision(Precision::Decimals(2))
        })
    })
    .as_ref()
}

/// Formats an amount as Mexican pesos: `$1,234.56`, `-$89.90`.
///
/// Amounts that round to zero cents print as `$0.00`, without a sign.
#[inline]
#[must_use]
pub fn format_pesos(amount: f64) -> String {
    static POSITIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();
    static NEGATIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let cents = (amount * 100.0).round();
    if !cents.is_finite() || cents.abs() < 0.5 {
        return "$0.00".to_owned();
    }
    let magnitude = cents.abs() / 100.0;
    let (cell, prefix) = if cents < 0.0 {
        (&NEGATIVE_FMT, "-$")
    } else {
        (&POSITIVE_FMT, "$")
    };

    let mut formatted = currency_formatter(cell, prefix).map_or_else(
        || format!("{prefix}{magnitude:.2}"),
        |fmt| fmt.fmt_string(magnitude),
    );

    // numfmt drops trailing zeros: "12.30" comes out as "12.3", "12" as "12".
    match formatted.rfind('.') {
        None => formatted.push_str(".00"),
        Some(dot) => {
            for _ in formatted.len().saturating_sub(dot + 1)..2 {
                formatted.push('0');
            }
        }
    }
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pesos_groups_thousands() {
        assert_eq!(format_pesos(1_234_567.891), "$1,234,567.89");
        assert_eq!(format_pesos(999.5), "$999.50");
        assert_eq!(format_pesos(1000.0), "$1,000.00");
    }

    #[test]
    fn pesos_negative_and_zero() {
        assert_eq!(format_pesos(-120.0), "-$120.00");
        assert_eq!(format_pesos(0.0), "$0.00");
        assert_eq!(format_pesos(-0.001), "$0.00");
        assert_eq!(format_pesos(-1_530.0), "-$1,530.00");
        assert_eq!(format_pesos(12.3), "$12.30");
        assert_eq!(format_pesos(0.05), "$0.05");
    }

    #[test]
    fn month_labels() {
        let key = MonthKey::new(2024, 3).unwrap();
        assert_eq!(month_label(key, Locale::Spanish), "marzo de 2024");
        assert_eq!(month_label(key, Locale::English), "March 2024");
        let dec = MonthKey::new(2023, 12).unwrap();
        assert_eq!(month_label(dec, Locale::default()), "diciembre de 2023");
        assert_eq!(month_label(dec, Locale::English), "December 2023");
        let sep = MonthKey::new(2024, 9).unwrap();
        assert_eq!(month_label(sep, Locale::Spanish), "septiembre de 2024");
    }

    #[test]
    fn long_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(format_long_date(date), "15 de enero de 2024");
    }
}
