//! Issued-token ids.
//!
//! Rows in `issued_tokens` are ranked by `(created_at, token_id)`, so ids are
//! generated app-side as UUIDv7 and sort in issue order even when two tokens
//! share a `created_at` instant.

use uuid::Uuid;

/// Id for a newly issued token. Later calls in this process sort higher.
pub fn new_token_id() -> Uuid {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn token_ids_sort_in_issue_order() {
        let ids: Vec<Uuid> = (0..256).map(|_| new_token_id()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn id_breaks_ties_between_same_instant_tokens() {
        let created_at = Utc::now();
        let first = (created_at, new_token_id());
        let second = (created_at, new_token_id());
        let latest = [second, first].into_iter().max().unwrap();
        assert_eq!(latest, second);
    }
}
