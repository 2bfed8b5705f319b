//! Fixed lookup data handed to the parser and reconciler.
//!
//! Everything here is built once from configuration and then only read.

use crate::utils::error::{RecordsError, Result};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Yard {
    pub code: String,
    pub folder: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YardTable {
    yards: Vec<Yard>,
}

impl YardTable {
    pub fn new(yards: Vec<Yard>) -> Self {
        Self { yards }
    }

    pub fn yards(&self) -> &[Yard] {
        &self.yards
    }

    pub fn get(&self, code: &str) -> Option<&Yard> {
        self.yards.iter().find(|y| y.code == code)
    }

    /// Two-letter section prefix of a plot id, upper-cased.
    pub fn section_prefix(plot_id: &str) -> String {
        plot_id.chars().take(2).collect::<String>().to_uppercase()
    }

    /// Resolve the yard a plot belongs to. Unknown prefixes are an error, never a default.
    pub fn yard_for_plot(&self, plot_id: &str) -> Result<&Yard> {
        let code = Self::section_prefix(plot_id);
        if code.chars().count() < 2 {
            return Err(RecordsError::UnknownYard { code });
        }
        self.get(&code)
            .ok_or(RecordsError::UnknownYard { code })
    }
}

/// Lots kept at "Not Available" whatever their rights say.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotAvailableLots {
    lots: HashSet<String>,
}

impl NotAvailableLots {
    pub fn new<I, S>(lots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lots: lots.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, lot_id: &str) -> bool {
        self.lots.contains(lot_id)
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }
}

/// Display order of image-type tags within one lot. Untyped images rank after every listed tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTypePriority {
    order: Vec<char>,
}

impl ImageTypePriority {
    pub fn new(order: Vec<char>) -> Self {
        Self { order }
    }

    pub fn letters(&self) -> &[char] {
        &self.order
    }

    pub fn rank(&self, image_type: Option<char>) -> usize {
        match image_type {
            Some(c) => self
                .order
                .iter()
                .position(|&t| t == c)
                .unwrap_or(self.order.len() + 1),
            None => self.order.len(),
        }
    }
}

impl Default for ImageTypePriority {
    fn default() -> Self {
        Self::new(vec!['F', 'B', 'P', 'V'])
    }
}

/// The immutable lookup tables one run works against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceData {
    pub yards: YardTable,
    pub not_available: NotAvailableLots,
    pub image_types: ImageTypePriority,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yards() -> YardTable {
        YardTable::new(vec![
            Yard {
                code: "CY".to_string(),
                folder: "OICA Church Yard".to_string(),
            },
            Yard {
                code: "IT".to_string(),
                folder: "OICA Intervale Terrace".to_string(),
            },
        ])
    }

    #[test]
    fn test_yard_for_plot() {
        let table = yards();
        assert_eq!(table.yard_for_plot("CYA1").unwrap().folder, "OICA Church Yard");
        assert_eq!(table.yard_for_plot("itc12").unwrap().code, "IT");
    }

    #[test]
    fn test_unknown_prefix_is_an_error() {
        let table = yards();
        match table.yard_for_plot("ZZA1") {
            Err(RecordsError::UnknownYard { code }) => assert_eq!(code, "ZZ"),
            other => panic!("expected UnknownYard, got {:?}", other),
        }
        assert!(table.yard_for_plot("C").is_err());
    }

    #[test]
    fn test_type_rank_orders_untyped_last() {
        let priority = ImageTypePriority::default();
        assert!(priority.rank(Some('F')) < priority.rank(Some('B')));
        assert!(priority.rank(Some('V')) < priority.rank(None));
        assert!(priority.rank(None) < priority.rank(Some('Q')));
    }
}
