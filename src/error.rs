use thiserror::Error;

/// Result type alias using [`ColaError`].
pub type Result<T> = std::result::Result<T, ColaError>;

/// Errors raised by [`Cola`](crate::Cola) operations.
///
/// None of these are retried internally: every operation is synchronous and
/// in-memory, so an error always belongs to the call that returned it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColaError {
    /// Two elements would compare equal. The store is left unchanged.
    #[error("duplicate key")]
    DuplicateKey,

    /// The levels hold fewer elements than the element count implies.
    #[error("structural inconsistency: expected {expected} elements, produced {produced}")]
    StructuralInconsistency { expected: usize, produced: usize },

    /// The store was mutated while an [`Enumerator`](crate::Enumerator) was live.
    #[error("collection was modified during enumeration")]
    VersionChanged,

    #[error("capacity exceeded: at most {capacity} elements")]
    CapacityExceeded { capacity: usize },

    #[error("invalid level count {levels} (must be 1..={max})")]
    InvalidLevelCount { levels: u32, max: u32 },

    #[error("key not found")]
    KeyNotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ColaError::DuplicateKey.to_string(), "duplicate key");
        assert_eq!(
            ColaError::StructuralInconsistency {
                expected: 4,
                produced: 3
            }
            .to_string(),
            "structural inconsistency: expected 4 elements, produced 3"
        );
        assert_eq!(
            ColaError::InvalidLevelCount { levels: 40, max: 31 }.to_string(),
            "invalid level count 40 (must be 1..=31)"
        );
    }
}
