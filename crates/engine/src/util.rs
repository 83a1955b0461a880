//! Internal helpers for mapping stored rows and building text searches.
//!
//! A row that cannot be mapped is corrupt storage, not bad input, so the
//! helpers report it as a database error.

use sea_orm::{DbErr, sea_query::LikeExpr};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_id(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| EngineError::Database(DbErr::Custom(format!("invalid {label} id: {value}"))))
}

/// Find the status whose stored representation is `value`.
pub(crate) fn parse_status<S: Copy>(
    value: &str,
    all: &[S],
    as_str: fn(S) -> &'static str,
) -> ResultEngine<S> {
    all.iter()
        .copied()
        .find(|status| as_str(*status) == value)
        .ok_or_else(|| EngineError::Database(DbErr::Custom(format!("invalid status: {value}"))))
}

const LIKE_ESCAPE: char = '\\';

/// `LIKE` pattern matching `text` anywhere, with `%` and `_` taken literally.
pub(crate) fn contains_pattern(text: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    LikeExpr::new(pattern).escape(LIKE_ESCAPE)
}
