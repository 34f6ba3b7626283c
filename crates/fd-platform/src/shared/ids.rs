//! Identifier Generator
//!
//! Document ids are BSON ObjectIds rendered as 24-character lowercase hex
//! strings and stored as plain strings in `_id` and in references.

use bson::oid::ObjectId;

/// Generator for document identifiers
pub struct IdGenerator;

impl IdGenerator {
    /// Generate a new id. Example output: "65f1c2a9e4b0a1d2c3f4e5a6"
    pub fn generate() -> String {
        ObjectId::new().to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_format() {
        let id = IdGenerator::generate();
        assert_eq!(id.len(), 24);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(ObjectId::parse_str(&id).is_ok());
    }

    #[test]
    fn test_generate_uniqueness() {
        let ids: HashSet<String> = (0..1000).map(|_| IdGenerator::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
