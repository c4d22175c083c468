//! Immutable periodic-table catalog.
//!
//! The catalog is built once at startup from the bundled data file and then
//! shared read-only (typically behind an `Arc`). Lookups never fail loudly:
//! a miss is `None` and callers fall back to a general chat context.

pub mod element;
pub mod error;
pub mod filter;

pub use element::{Block, Classification, ElementRecord, Series};
pub use error::{CatalogError, CatalogResult};
pub use filter::ElementFilter;

use std::collections::{BTreeSet, HashMap, HashSet};

/// Bundled element data (array of records, camelCase fields).
const BUNDLED_ELEMENTS: &str = include_str!("../../data/elements.json");

/// Number of elements the catalog must hold.
pub const ELEMENT_COUNT: usize = 118;

/// Ordered, read-only collection of element records.
#[derive(Clone, Debug)]
pub struct ElementCatalog {
    records: Vec<ElementRecord>,
    by_name: HashMap<String, usize>,
}

impl ElementCatalog {
    /// Load the data file that ships with the crate.
    ///
    /// # Errors
    /// Returns an error if the bundled file is malformed.
    pub fn bundled() -> CatalogResult<Self> {
        Self::from_json(BUNDLED_ELEMENTS)
    }

    /// Parse and validate a JSON array of element records.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or any catalog invariant is broken.
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        let records: Vec<ElementRecord> = serde_json::from_str(json)?;
        Self::from_records(records)
    }

    /// Build a catalog from already-parsed records.
    ///
    /// # Errors
    /// Returns `CatalogError::Invalid` when the records are not exactly one per
    /// atomic number 1-118 with unique names and symbols.
    pub fn from_records(mut records: Vec<ElementRecord>) -> CatalogResult<Self> {
        if records.len() != ELEMENT_COUNT {
            return Err(CatalogError::Invalid(format!(
                "expected {ELEMENT_COUNT} elements, found {}",
                records.len()
            )));
        }

        records.sort_by_key(|r| r.atomic_number);

        let mut symbols = HashSet::with_capacity(ELEMENT_COUNT);
        let mut by_name = HashMap::with_capacity(ELEMENT_COUNT);

        for (idx, record) in records.iter().enumerate() {
            validate_record(idx, record)?;

            if !symbols.insert(record.symbol.to_ascii_lowercase()) {
                return Err(CatalogError::Invalid(format!(
                    "duplicate symbol {}",
                    record.symbol
                )));
            }
            if by_name.insert(record.name.to_lowercase(), idx).is_some() {
                return Err(CatalogError::Invalid(format!(
                    "duplicate name {}",
                    record.name
                )));
            }
        }

        tracing::debug!("Element catalog loaded with {} records", records.len());
        Ok(Self { records, by_name })
    }

    /// Lookup by atomic number.
    #[must_use]
    pub fn lookup_by_atomic_number(&self, atomic_number: u32) -> Option<&ElementRecord> {
        let idx = usize::try_from(atomic_number).ok()?.checked_sub(1)?;
        self.records.get(idx)
    }

    /// Case-insensitive exact lookup by name.
    #[must_use]
    pub fn lookup_by_name(&self, name: &str) -> Option<&ElementRecord> {
        self.by_name
            .get(&name.trim().to_lowercase())
            .and_then(|&idx| self.records.get(idx))
    }

    /// Distinct classifications present in the catalog, sorted.
    #[must_use]
    pub fn list_classifications(&self) -> BTreeSet<Classification> {
        self.records.iter().map(|r| r.classification).collect()
    }

    /// Records matching a filter, in atomic-number order.
    #[must_use]
    pub fn filter(&self, filter: &ElementFilter) -> Vec<&ElementRecord> {
        self.records.iter().filter(|r| filter.matches(r)).collect()
    }

    /// All records in atomic-number order.
    #[must_use]
    pub fn records(&self) -> &[ElementRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false for a validated catalog.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn validate_record(idx: usize, record: &ElementRecord) -> CatalogResult<()> {
    let expected = idx + 1;
    if usize::from(record.atomic_number) != expected {
        return Err(CatalogError::Invalid(format!(
            "missing or duplicate atomic number near {expected}"
        )));
    }
    if record.symbol.trim().is_empty() || record.name.trim().is_empty() {
        return Err(CatalogError::Invalid(format!(
            "element {expected} has an empty name or symbol"
        )));
    }
    if !(1..=7).contains(&record.period) {
        return Err(CatalogError::Invalid(format!(
            "element {expected} has period {}",
            record.period
        )));
    }
    if let Some(group) = record.group.filter(|g| !(1..=18).contains(g)) {
        return Err(CatalogError::Invalid(format!(
            "element {expected} has group {group}"
        )));
    }
    Ok(())
}
