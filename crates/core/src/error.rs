use thiserror::Error;

/// Errors raised by the pure slug transformations.
///
/// None of these are retryable: they describe structurally invalid input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// Slug became empty once NUL bytes and surrounding whitespace were removed.
    #[error("slug is empty after sanitization (raw: {raw:?})")]
    EmptySlug { raw: String },

    /// Lookup request carried more slugs than allowed.
    #[error("too many slugs: {count} (max {max})")]
    TooManySlugs { count: usize, max: usize },

    /// Search query normalized to nothing.
    #[error("search query is empty after normalization")]
    EmptyQuery,
}

pub type Result<T> = std::result::Result<T, SlugError>;
