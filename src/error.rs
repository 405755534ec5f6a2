use thiserror::Error;

/// Errors returned by [`HashMap`](crate::HashMap) lookups.
///
/// Only checked access can fail; every other operation is total over its
/// inputs (duplicate inserts and erases of absent keys are no-ops).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapError {
    /// `at` was called with a key that is not present.
    #[error("key not found")]
    KeyNotFound,
}

pub type Result<T> = std::result::Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::MapError;

    #[test]
    fn key_not_found_display() {
        assert_eq!(MapError::KeyNotFound.to_string(), "key not found");
    }
}
