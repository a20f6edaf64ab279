use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use super::errors::DomainError;

/// Delimiter used for the denormalized image-reference list stored in the
/// `images` column. References must never contain it.
pub const REFERENCE_DELIMITER: char = ',';

/// Fields supplied when an order is created. `status` and `created_at` are
/// assigned by the database.
#[derive(Debug, Clone, Default)]
pub struct OrderDraft {
    pub product: Option<String>,
    pub comment: Option<String>,
    pub letter_style: Option<String>,
    pub design: Option<String>,
    pub deadline: Option<String>,
    pub price: Option<BigDecimal>,
}

/// A stored order as read back from the persistence layer.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: i32,
    pub product: Option<String>,
    pub comment: Option<String>,
    pub letter_style: Option<String>,
    pub design: Option<String>,
    pub deadline: Option<String>,
    pub price: Option<BigDecimal>,
    pub status: String,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Partial update: an absent field keeps the stored value (coalesce
/// semantics). `letter_style` and `design` are set at creation only and
/// cannot be patched. `images` is populated by the service when replacement
/// files were uploaded, never directly by a client field.
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub status: Option<String>,
    pub product: Option<String>,
    pub comment: Option<String>,
    pub deadline: Option<String>,
    pub price: Option<BigDecimal>,
    pub images: Option<Vec<String>>,
}

/// Concrete column values an update writes, produced by resolving an
/// `OrderPatch` against the current row.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedUpdate {
    pub product: Option<String>,
    pub comment: Option<String>,
    pub deadline: Option<String>,
    pub price: Option<BigDecimal>,
    pub status: String,
    pub images: String,
}

impl OrderPatch {
    /// Resolve this patch against the stored order. Each supplied field wins;
    /// each absent field keeps the current value. Coalesce semantics can
    /// never null out a column.
    pub fn resolve(&self, current: &OrderView) -> Result<ResolvedUpdate, DomainError> {
        let images = match &self.images {
            Some(refs) => join_references(refs)?,
            None => join_references(&current.images)?,
        };
        Ok(ResolvedUpdate {
            product: self.product.clone().or_else(|| current.product.clone()),
            comment: self.comment.clone().or_else(|| current.comment.clone()),
            deadline: self.deadline.clone().or_else(|| current.deadline.clone()),
            price: self.price.clone().or_else(|| current.price.clone()),
            status: self
                .status
                .clone()
                .unwrap_or_else(|| current.status.clone()),
            images,
        })
    }

    /// True when the patch carries replacement image references.
    pub fn replaces_images(&self) -> bool {
        self.images.is_some()
    }
}

/// Join references into the stored representation, rejecting any reference
/// that contains the delimiter.
pub fn join_references<S: AsRef<str>>(refs: &[S]) -> Result<String, DomainError> {
    for r in refs {
        if r.as_ref().contains(REFERENCE_DELIMITER) {
            return Err(DomainError::InvalidInput(format!(
                "image reference '{}' contains the reserved delimiter",
                r.as_ref()
            )));
        }
    }
    Ok(refs
        .iter()
        .map(|r| r.as_ref())
        .collect::<Vec<_>>()
        .join(","))
}

/// Split the stored representation back into references. An empty column
/// means no images.
pub fn split_references(stored: &str) -> Vec<String> {
    if stored.is_empty() {
        return Vec::new();
    }
    stored.split(REFERENCE_DELIMITER).map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn stored_order() -> OrderView {
        OrderView {
            id: 1,
            product: Some("Card".to_string()),
            comment: Some("gold trim".to_string()),
            letter_style: Some("cursive".to_string()),
            design: Some("floral".to_string()),
            deadline: Some("next friday".to_string()),
            price: Some(BigDecimal::from_str("10").unwrap()),
            status: "New".to_string(),
            images: vec!["a.jpg".to_string(), "b.jpg".to_string()],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_patch_keeps_every_field() {
        let current = stored_order();
        let resolved = OrderPatch::default().resolve(&current).unwrap();
        assert_eq!(resolved.product.as_deref(), Some("Card"));
        assert_eq!(resolved.comment.as_deref(), Some("gold trim"));
        assert_eq!(resolved.deadline.as_deref(), Some("next friday"));
        assert_eq!(resolved.price, current.price);
        assert_eq!(resolved.status, "New");
        assert_eq!(resolved.images, "a.jpg,b.jpg");
    }

    #[test]
    fn supplied_fields_win_others_are_kept() {
        let patch = OrderPatch {
            status: Some("Done".to_string()),
            deadline: Some("tomorrow".to_string()),
            ..OrderPatch::default()
        };
        let resolved = patch.resolve(&stored_order()).unwrap();
        assert_eq!(resolved.status, "Done");
        assert_eq!(resolved.deadline.as_deref(), Some("tomorrow"));
        assert_eq!(resolved.product.as_deref(), Some("Card"));
        assert_eq!(resolved.images, "a.jpg,b.jpg");
    }

    #[test]
    fn replacement_images_overwrite_stored_list() {
        let patch = OrderPatch {
            images: Some(vec!["c.jpg".to_string()]),
            ..OrderPatch::default()
        };
        let resolved = patch.resolve(&stored_order()).unwrap();
        assert_eq!(resolved.images, "c.jpg");
    }

    #[test]
    fn reference_with_delimiter_is_rejected() {
        let patch = OrderPatch {
            images: Some(vec!["a,b.jpg".to_string()]),
            ..OrderPatch::default()
        };
        assert!(patch.resolve(&stored_order()).is_err());
    }

    #[test]
    fn split_of_empty_column_is_empty() {
        assert!(split_references("").is_empty());
        assert_eq!(split_references("x.png"), vec!["x.png"]);
    }

    #[test]
    fn join_of_no_references_is_empty_column() {
        assert_eq!(join_references::<&str>(&[]).unwrap(), "");
    }
}
