//! Domain error types.
//!
//! These errors represent construction failures in the itinerary model.
//! They are distinct from transport and backend errors.

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// Itinerary has no legs
    #[error("itinerary must have at least one leg")]
    EmptyItinerary,

    /// Bounding box given with the wrong number of components
    #[error("bounding box must have four components, got {0}")]
    MalformedBoundingBox(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::EmptyItinerary;
        assert_eq!(err.to_string(), "itinerary must have at least one leg");

        let err = DomainError::MalformedBoundingBox(3);
        assert_eq!(
            err.to_string(),
            "bounding box must have four components, got 3"
        );
    }
}
