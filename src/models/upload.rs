//! Bank-statement upload models.

use serde::{Deserialize, Serialize};

use super::AmountField;

/// A movement the backend extracted from an uploaded statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTransaction {
    /// Operation date, e.g. `04-Jun-2025`.
    #[serde(default)]
    pub fecha_operacion: Option<String>,
    /// Charge date, used when the operation date is missing.
    #[serde(default)]
    pub fecha_cargo: Option<String>,
    /// Statement line description.
    #[serde(default)]
    pub descripcion: String,
    /// Amount as printed on the statement, absent when the extractor could
    /// not read it.
    #[serde(default)]
    pub monto: Option<AmountField>,
}

impl ExtractedTransaction {
    /// Operation date, falling back to the charge date.
    #[inline]
    #[must_use]
    pub fn date_text(&self) -> Option<&str> {
        self.fecha_operacion
            .as_deref()
            .or(self.fecha_cargo.as_deref())
    }
}

/// Result of `POST /usuarios/{id}/upload-pdf/`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PdfUploadResponse {
    /// Extraction method the backend used (text layer, OCR, ...).
    #[serde(default)]
    pub method: Option<String>,
    /// Number of pages in the document.
    #[serde(default)]
    pub total_pages: Option<u32>,
    /// Raw extracted text.
    #[serde(default)]
    pub text: Option<String>,
    /// Movements found in the statement.
    #[serde(default)]
    pub transactions: Vec<ExtractedTransaction>,
}
