use serde::Serialize;

use crate::catalog::TypeDescriptor;

/// Filter and pagination criteria for [`crate::catalog::TypeCatalog::query`].
///
/// The default query matches every cached descriptor and applies no page limit. Text
/// comparisons are case-insensitive; the parent filter is an exact match on the direct parent,
/// not a hierarchy walk.
///
/// # Examples
///
/// ```rust
/// use propscope::catalog::TypeQuery;
///
/// let query = TypeQuery::new()
///     .with_search_text("vector")
///     .with_include_abstract(false)
///     .with_page(20, 10);
/// assert_eq!(query.page_offset, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeQuery {
    /// Exact category, compared case-insensitively
    pub category: Option<String>,
    /// Substring of the name or display name, compared case-insensitively
    pub search_text: Option<String>,
    /// Canonical path of the direct parent type
    pub parent_path: Option<String>,
    /// Include abstract types
    pub include_abstract: bool,
    /// Include deprecated types
    pub include_deprecated: bool,
    /// Include types generated from user assets
    pub include_user_types: bool,
    /// Include native (non user asset) types
    pub include_native_types: bool,
    /// Number of matching descriptors to skip
    pub page_offset: usize,
    /// Maximum number of descriptors to return
    pub max_results: Option<usize>,
}

impl TypeQuery {
    /// Create a query matching everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one category
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Restrict to names containing `text`
    #[must_use]
    pub fn with_search_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    /// Restrict to direct children of `parent_path`
    #[must_use]
    pub fn with_parent(mut self, parent_path: impl Into<String>) -> Self {
        self.parent_path = Some(parent_path.into());
        self
    }

    /// Include or exclude abstract types
    #[must_use]
    pub fn with_include_abstract(mut self, include: bool) -> Self {
        self.include_abstract = include;
        self
    }

    /// Include or exclude deprecated types
    #[must_use]
    pub fn with_include_deprecated(mut self, include: bool) -> Self {
        self.include_deprecated = include;
        self
    }

    /// Include or exclude user asset types
    #[must_use]
    pub fn with_include_user_types(mut self, include: bool) -> Self {
        self.include_user_types = include;
        self
    }

    /// Include or exclude native types
    #[must_use]
    pub fn with_include_native_types(mut self, include: bool) -> Self {
        self.include_native_types = include;
        self
    }

    /// Set offset and page size
    #[must_use]
    pub fn with_page(mut self, offset: usize, max_results: usize) -> Self {
        self.page_offset = offset;
        self.max_results = Some(max_results);
        self
    }

    pub(crate) fn matcher(&self) -> QueryMatcher<'_> {
        QueryMatcher {
            query: self,
            category: self.category.as_deref().map(str::to_lowercase),
            needle: self
                .search_text
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_lowercase),
        }
    }
}

impl Default for TypeQuery {
    fn default() -> Self {
        TypeQuery {
            category: None,
            search_text: None,
            parent_path: None,
            include_abstract: true,
            include_deprecated: true,
            include_user_types: true,
            include_native_types: true,
            page_offset: 0,
            max_results: None,
        }
    }
}

/// A query with its text criteria lowercased once per call
pub(crate) struct QueryMatcher<'a> {
    query: &'a TypeQuery,
    category: Option<String>,
    needle: Option<String>,
}

impl QueryMatcher<'_> {
    pub(crate) fn matches(&self, descriptor: &TypeDescriptor) -> bool {
        let query = self.query;

        if descriptor.is_abstract && !query.include_abstract {
            return false;
        }
        if descriptor.is_deprecated && !query.include_deprecated {
            return false;
        }
        if descriptor.is_generated_from_user_asset && !query.include_user_types {
            return false;
        }
        if !descriptor.is_generated_from_user_asset && !query.include_native_types {
            return false;
        }
        if let Some(parent) = &query.parent_path {
            if descriptor.parent_path.as_deref() != Some(parent.as_str()) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if descriptor.category.to_lowercase() != *category {
                return false;
            }
        }
        if let Some(needle) = &self.needle {
            return descriptor.name.to_lowercase().contains(needle.as_str())
                || descriptor.display_name.to_lowercase().contains(needle.as_str());
        }

        true
    }
}

/// One page of query results.
#[derive(Debug, Clone, Serialize)]
pub struct QueryPage {
    /// Descriptors on this page, in snapshot order
    pub types: Vec<TypeDescriptor>,
    /// Number of descriptors matching the filters, ignoring pagination
    pub total_count: usize,
    /// Generation of the snapshot the page was drawn from
    pub generation: u64,
}
