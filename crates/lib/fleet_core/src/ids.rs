// Record identifiers handed out by the in-memory store.
//
// UUIDv7 keeps ids time-ordered, so users listed by id come back in
// creation order.

use uuid::Uuid;

/// A fresh user id: a hyphenated, lower-case UUIDv7.
pub fn new_user_id() -> String {
    Uuid::now_v7().hyphenated().to_string()
}

/// Whether `id` has the shape produced by [`new_user_id`].
#[cfg(test)]
pub(crate) fn is_user_id(id: &str) -> bool {
    Uuid::try_parse(id)
        .map(|u| u.get_version() == Some(uuid::Version::SortRand))
        .unwrap_or(false)
}
