//! Keyword-based category suggestions and chart colours.
//!
//! Used when the user creates a transaction without picking a category,
//! and when statement movements extracted from a PDF are saved.

use chrono::NaiveDate;

use crate::ingest::{parse_amount, parse_date};
use crate::models::{ExtractedTransaction, TransactionInput, UNCATEGORIZED};

/// Category assigned when no keyword matches.
pub const FALLBACK_CATEGORY: &str = "Otros";

/// Keyword rules, checked in order; the first hit wins. A keyword matches
/// the start of a word, so `rest` finds `restaurante` but not `interes`.
const RULES: &[(&[&str], &str)] = &[
    (&["rest", "cafe", "taqueria", "comida"], "Comida y Restaurantes"),
    (&["viva", "aerobus", "greyhound", "vuelo"], "Transporte y Viajes"),
    (&["heb", "super", "mercado", "oxxo"], "Compras y Supermercado"),
    (&["pago", "spei", "transferencia"], "Pagos y Transferencias"),
    (&["interes", "comision"], "Intereses y Comisiones"),
    (&["hotel", "alojamiento"], "Hospedaje"),
    (&["gasolina", "combustible"], "Transporte"),
    (&["entretenimiento", "cine", "evento"], "Entretenimiento"),
];

/// Chart colours for the known categories.
const COLORS: &[(&str, &str)] = &[
    ("Comida y Restaurantes", "#ff6b6b"),
    ("Transporte y Viajes", "#4ecdc4"),
    ("Compras y Supermercado", "#45b7d1"),
    ("Pagos y Transferencias", "#96ceb4"),
    ("Intereses y Comisiones", "#feca57"),
    ("Hospedaje", "#ff9ff3"),
    ("Transporte", "#54a0ff"),
    ("Entretenimiento", "#5f27cd"),
];

/// Colour for [`UNCATEGORIZED`] and any unknown category.
const UNCATEGORIZED_COLOR: &str = "#8395a7";

/// Suggests a category from a transaction description.
#[inline]
#[must_use]
pub fn suggest_category(description: &str) -> &'static str {
    let lower = description.to_lowercase();
    let words: Vec<&str> = lower
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();
    RULES
        .iter()
        .find(|&&(keywords, _)| {
            keywords
                .iter()
                .any(|kw| words.iter().any(|word| word.starts_with(*kw)))
        })
        .map_or(FALLBACK_CATEGORY, |&(_, category)| category)
}

/// Hex colour used to draw a category in charts.
#[inline]
#[must_use]
pub fn category_color(category: &str) -> &'static str {
    if category == UNCATEGORIZED {
        return UNCATEGORIZED_COLOR;
    }
    COLORS
        .iter()
        .find(|&&(name, _)| name == category)
        .map_or(UNCATEGORIZED_COLOR, |&(_, color)| color)
}

/// Statement movements converted into transactions ready to be created.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreparedImport {
    /// Request bodies, in statement order.
    pub inputs: Vec<TransactionInput>,
    /// Rows whose date could not be read and were dated `today`.
    pub defaulted_dates: usize,
    /// Rows whose amount could not be read and were set to zero.
    pub zeroed_amounts: usize,
}

/// Converts extracted statement rows into transaction inputs.
///
/// Statement rows are charges, so positive amounts are negated. Each row
/// gets a suggested category. A row with an unreadable date is dated
/// `today` and counted in [`PreparedImport::defaulted_dates`]; a row with a
/// missing or unreadable amount is kept at zero and counted in
/// [`PreparedImport::zeroed_amounts`].
#[inline]
#[must_use]
pub fn prepare_extracted(rows: &[ExtractedTransaction], today: NaiveDate) -> PreparedImport {
    let mut prepared = PreparedImport::default();
    for row in rows {
        let date = row.date_text().and_then(parse_date).unwrap_or_else(|| {
            prepared.defaulted_dates += 1;
            tracing::warn!(date = ?row.date_text(), "statement date unreadable, using today");
            today
        });
        let amount = row.monto.as_ref().and_then(parse_amount).unwrap_or_else(|| {
            prepared.zeroed_amounts += 1;
            tracing::warn!(amount = ?row.monto, "statement amount unreadable, using zero");
            0.0
        });
        prepared.inputs.push(TransactionInput {
            date,
            description: row.descripcion.clone(),
            amount: -amount.abs(),
            category: Some(suggest_category(&row.descripcion).to_owned()),
        });
    }
    prepared
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AmountField;

    #[test]
    fn suggests_by_keyword() {
        assert_eq!(suggest_category("TAQUERIA EL GUERO"), "Comida y Restaurantes");
        assert_eq!(suggest_category("Viva Aerobus MTY"), "Transporte y Viajes");
        assert_eq!(suggest_category("OXXO SUC 123"), "Compras y Supermercado");
        assert_eq!(suggest_category("SPEI enviado"), "Pagos y Transferencias");
        assert_eq!(suggest_category("Comision anual"), "Intereses y Comisiones");
        assert_eq!(suggest_category("Hotel Fiesta"), "Hospedaje");
        assert_eq!(suggest_category("Gasolina Pemex"), "Transporte");
        assert_eq!(suggest_category("Cinepolis"), "Entretenimiento");
    }

    #[test]
    fn keywords_match_word_starts_only() {
        assert_eq!(suggest_category("INTERES GANADO"), "Intereses y Comisiones");
        assert_eq!(suggest_category("Intereses ordinarios"), "Intereses y Comisiones");
        assert_eq!(suggest_category("RESTAURANTE LA NORIA"), "Comida y Restaurantes");
        assert_eq!(suggest_category("Pago*Supermercado"), "Compras y Supermercado");
    }

    #[test]
    fn first_rule_wins() {
        // "supermercado" would match the grocery rule, "cafe" comes first.
        assert_eq!(suggest_category("Cafe del supermercado"), "Comida y Restaurantes");
    }

    #[test]
    fn unknown_description_falls_back() {
        assert_eq!(suggest_category("Amazon Marketplace"), FALLBACK_CATEGORY);
        assert_eq!(suggest_category(""), FALLBACK_CATEGORY);
    }

    #[test]
    fn colors() {
        assert_eq!(category_color("Hospedaje"), "#ff9ff3");
        assert_eq!(category_color(UNCATEGORIZED), UNCATEGORIZED_COLOR);
        assert_eq!(category_color("Mascotas"), UNCATEGORIZED_COLOR);
    }

    #[test]
    fn prepare_extracted_negates_and_categorizes() {
        let today = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let rows = vec![
            ExtractedTransaction {
                fecha_operacion: Some("04-Jun-2025".to_owned()),
                fecha_cargo: None,
                descripcion: "VIVA AEROBUS".to_owned(),
                monto: Some(AmountField::Text("1,530.00".to_owned())),
            },
            ExtractedTransaction {
                fecha_operacion: None,
                fecha_cargo: Some("sin fecha".to_owned()),
                descripcion: "Cargo desconocido".to_owned(),
                monto: Some(AmountField::Number(-80.0)),
            },
            ExtractedTransaction {
                fecha_operacion: None,
                fecha_cargo: Some("2025-06-05".to_owned()),
                descripcion: "OXXO".to_owned(),
                monto: Some(AmountField::Text("???".to_owned())),
            },
        ];
        let prepared = prepare_extracted(&rows, today);
        assert_eq!(prepared.defaulted_dates, 1);
        assert_eq!(prepared.zeroed_amounts, 1);

        let first = prepared.inputs.first().unwrap();
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2025, 6, 4).unwrap());
        assert!((first.amount + 1530.0).abs() < 1e-9);
        assert_eq!(first.category.as_deref(), Some("Transporte y Viajes"));

        let second = prepared.inputs.get(1).unwrap();
        assert_eq!(second.date, today);
        assert!((second.amount + 80.0).abs() < 1e-9);
        assert_eq!(second.category.as_deref(), Some(FALLBACK_CATEGORY));

        let third = prepared.inputs.get(2).unwrap();
        assert!(third.amount.abs() < 1e-9);
    }

    #[test]
    fn prepare_extracted_zeroes_missing_amounts() {
        let today = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let rows = vec![ExtractedTransaction {
            fecha_operacion: Some("05-Jun-2025".to_owned()),
            fecha_cargo: None,
            descripcion: "OXXO".to_owned(),
            monto: None,
        }];
        let prepared = prepare_extracted(&rows, today);
        assert_eq!(prepared.zeroed_amounts, 1);
        assert_eq!(prepared.defaulted_dates, 0);
        assert!(prepared.inputs.first().unwrap().amount.abs() < 1e-9);
    }
}
