//! Category filtering
//!
//! Restricts a loaded catalog to the translation sections an app
//! actually ships, by dot-prefix match on the key structure.

use crate::catalog::Catalog;

/// Keeps only keys whose dotted prefix matches one of `categories`.
///
/// An empty `categories` list is the identity. A category may carry a
/// trailing `.*`, which is stripped before matching. Matching is on the
/// dot structure (`"common"` matches `"common.save"` but not
/// `"commons.save"`), never a substring match.
pub fn filter_categories(catalog: Catalog, categories: &[String]) -> Catalog {
    if categories.is_empty() {
        return catalog;
    }

    let prefixes = dot_prefixes(categories);
    catalog
        .into_iter()
        .filter(|(key, _)| prefixes.iter().any(|p| key.starts_with(p.as_str())))
        .collect()
}

fn dot_prefixes(categories: &[String]) -> Vec<String> {
    categories
        .iter()
        .map(|c| format!("{}.", c.strip_suffix(".*").unwrap_or(c)))
        .collect()
}

/// Per-app category selection
///
/// Apps configure either an allow-list or a deny-list of top-level key
/// prefixes; `All` ships every section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Include(Vec<String>),
    Exclude(Vec<String>),
}

impl CategoryFilter {
    /// Applies the selection to a catalog
    pub fn apply(&self, catalog: Catalog) -> Catalog {
        match self {
            Self::All => catalog,
            Self::Include(categories) => filter_categories(catalog, categories),
            Self::Exclude(categories) => {
                if categories.is_empty() {
                    return catalog;
                }
                let prefixes = dot_prefixes(categories);
                catalog
                    .into_iter()
                    .filter(|(key, _)| !prefixes.iter().any(|p| key.starts_with(p.as_str())))
                    .collect()
            }
        }
    }

    /// Builds a selection from configured lists; an allow-list wins
    /// over a deny-list when both are present.
    pub fn from_lists(included: &[String], excluded: &[String]) -> Self {
        if !included.is_empty() {
            Self::Include(included.to_vec())
        } else if !excluded.is_empty() {
            Self::Exclude(excluded.to_vec())
        } else {
            Self::All
        }
    }
}
