//! Per-leaf indexing conventions.

use std::fmt;
use std::sync::Arc;

use crate::document::field::FieldOption;
use crate::mapping::leaf::LeafKind;

type Convention = Arc<dyn Fn(&str, LeafKind) -> bool + Send + Sync>;

/// Decides, for each projected leaf, whether it is analyzed and whether it
/// is stored verbatim.
///
/// Both predicates receive the dotted field path and the leaf kind. The
/// defaults analyze string leaves and store nothing; the source payload in
/// the envelope is what reconstruction reads.
///
/// # Example
///
/// ```
/// use docmap::mapping::{FieldConventions, LeafKind};
///
/// let conventions = FieldConventions::default()
///     .analyze_when(|path, kind| kind == LeafKind::String && path != "sku")
///     .store_when(|path, _| path == "title");
///
/// assert!(!conventions.should_analyze("sku", LeafKind::String));
/// assert!(conventions.should_store("title", LeafKind::String));
/// ```
#[derive(Clone)]
pub struct FieldConventions {
    analyze: Convention,
    store: Convention,
}

impl FieldConventions {
    /// Create conventions with the default predicates.
    pub fn new() -> Self {
        FieldConventions {
            analyze: Arc::new(|_, kind| kind == LeafKind::String),
            store: Arc::new(|_, _| false),
        }
    }

    /// Replace the analyze predicate.
    pub fn analyze_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str, LeafKind) -> bool + Send + Sync + 'static,
    {
        self.analyze = Arc::new(predicate);
        self
    }

    /// Replace the store predicate.
    pub fn store_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str, LeafKind) -> bool + Send + Sync + 'static,
    {
        self.store = Arc::new(predicate);
        self
    }

    /// Whether the leaf at `path` is tokenized.
    ///
    /// Only string leaves can be analyzed; the predicate is not consulted
    /// for numeric encodings.
    pub fn should_analyze(&self, path: &str, kind: LeafKind) -> bool {
        kind == LeafKind::String && (self.analyze)(path, kind)
    }

    /// Whether the leaf at `path` is stored verbatim.
    pub fn should_store(&self, path: &str, kind: LeafKind) -> bool {
        (self.store)(path, kind)
    }

    /// The field options for a leaf.
    pub fn option_for(&self, path: &str, kind: LeafKind) -> FieldOption {
        FieldOption::exact()
            .with_analyzed(self.should_analyze(path, kind))
            .with_stored(self.should_store(path, kind))
    }
}

impl Default for FieldConventions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FieldConventions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldConventions").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let conventions = FieldConventions::default();

        let text = conventions.option_for("title", LeafKind::String);
        assert!(text.indexed && text.analyzed && !text.stored);

        let number = conventions.option_for("count", LeafKind::Integer);
        assert!(number.indexed && !number.analyzed && !number.stored);
    }

    #[test]
    fn test_numeric_leaves_are_never_analyzed() {
        let conventions = FieldConventions::default().analyze_when(|_, _| true);
        assert!(!conventions.should_analyze("count", LeafKind::Integer));
        assert!(conventions.should_analyze("name", LeafKind::String));
    }

    #[test]
    fn test_custom_store_predicate() {
        let conventions =
            FieldConventions::default().store_when(|_, kind| kind == LeafKind::DateTime);
        assert!(conventions.should_store("created", LeafKind::DateTime));
        assert!(!conventions.should_store("created", LeafKind::Integer));
    }
}
