//! Database row types. These map directly to SQLite rows and are kept
//! separate from the inkwell-types API models.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use inkwell_types::models::{Post, User};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: u32,
    pub nickname: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A post joined with its author.
#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub author_id: u32,
    pub created_at: String,
    pub updated_at: String,
    pub author: UserRow,
}

pub struct NewUser<'a> {
    pub nickname: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

/// Columns left as `None` keep their stored value.
#[derive(Default)]
pub struct UserPatch<'a> {
    pub nickname: Option<&'a str>,
    pub email: Option<&'a str>,
    pub password_hash: Option<&'a str>,
}

pub struct NewPost<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub author_id: u32,
}

pub struct PostPatch<'a> {
    pub title: &'a str,
    pub content: &'a str,
}

/// SQLite stores `datetime('now')` as "YYYY-MM-DD HH:MM:SS" without a
/// timezone; those values are UTC.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            nickname: row.nickname,
            email: row.email,
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        }
    }
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            title: row.title,
            content: row.content,
            author_id: row.author_id,
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
            author: row.author.into(),
        }
    }
}
