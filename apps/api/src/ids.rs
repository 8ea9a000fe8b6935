//! Short identifiers for résumé list items.
//!
//! Ids are list keys only: 9 base-36 characters drawn from a v4 UUID's random bits.
//! They are opaque, never derived from position, and never recomputed.

use uuid::Uuid;

const ID_LEN: usize = 9;
const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates a fresh random identifier.
pub fn generate_id() -> String {
    let mut bits = Uuid::new_v4().as_u128();
    let mut id = String::with_capacity(ID_LEN);
    for _ in 0..ID_LEN {
        id.push(ALPHABET[(bits % 36) as usize] as char);
        bits /= 36;
    }
    id
}

/// Generates an identifier that `is_taken` does not already claim.
pub fn fresh_id(is_taken: impl Fn(&str) -> bool) -> String {
    loop {
        let id = generate_id();
        if !is_taken(&id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_id_shape() {
        let id = generate_id();
        assert_eq!(id.len(), ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_ids_do_not_repeat_in_practice() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_fresh_id_skips_taken() {
        // Reject the first two candidates, accept the third.
        let calls = Cell::new(0);
        let id = fresh_id(|_| {
            calls.set(calls.get() + 1);
            calls.get() < 3
        });
        assert_eq!(calls.get(), 3);
        assert_eq!(id.len(), ID_LEN);
    }
}
