//! UUID helpers.

use uuid::Uuid;

/// Generate a UUIDv7.
///
/// v7 embeds a Unix timestamp, so primary keys sort in insertion order —
/// which keeps "newest" listings index-friendly.
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Check whether a UUID is version 7.
pub fn is_v7(id: &Uuid) -> bool {
    id.get_version_num() == 7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_v7_is_v7() {
        assert!(is_v7(&new_v7()));
    }

    #[test]
    fn test_new_v7_sorts_by_creation() {
        let a = new_v7();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = new_v7();
        assert!(a < b);
    }
}
