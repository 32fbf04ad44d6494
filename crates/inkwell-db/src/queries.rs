use rusqlite::{Connection, OptionalExtension, Row};

use crate::models::{NewPost, NewUser, PostPatch, PostRow, UserPatch, UserRow};
use crate::{Database, Result};

const USER_COLUMNS: &str = "id, nickname, email, password, created_at, updated_at";

const POST_SELECT: &str = "
    SELECT p.id, p.title, p.content, p.author_id, p.created_at, p.updated_at,
           u.id, u.nickname, u.email, u.password, u.created_at, u.updated_at
    FROM posts p
    JOIN users u ON u.id = p.author_id";

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &NewUser<'_>) -> Result<UserRow> {
        self.with_conn(|conn| {
            let row = conn.query_row(
                &format!(
                    "INSERT INTO users (nickname, email, password) VALUES (?1, ?2, ?3)
                     RETURNING {USER_COLUMNS}"
                ),
                (user.nickname, user.email, user.password_hash),
                map_user,
            )?;
            Ok(row)
        })
    }

    pub fn find_all_users(&self, limit: u32) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT ?1"))?;
            let rows = stmt
                .query_map([limit], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn find_user_by_id(&self, id: u32) -> Result<UserRow> {
        self.with_conn(|conn| {
            let row = conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                [id],
                map_user,
            )?;
            Ok(row)
        })
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                    [email],
                    map_user,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Apply `patch` and bump `updated_at`. Fails with `NotFound` when no
    /// user has this id.
    pub fn update_user(&self, id: u32, patch: &UserPatch<'_>) -> Result<UserRow> {
        self.with_conn(|conn| {
            let row = conn.query_row(
                &format!(
                    "UPDATE users
                     SET nickname   = COALESCE(?1, nickname),
                         email      = COALESCE(?2, email),
                         password   = COALESCE(?3, password),
                         updated_at = datetime('now')
                     WHERE id = ?4
                     RETURNING {USER_COLUMNS}"
                ),
                rusqlite::params![patch.nickname, patch.email, patch.password_hash, id],
                map_user,
            )?;
            Ok(row)
        })
    }

    /// Returns the number of rows removed: 1, or 0 if the user was already gone.
    pub fn delete_user(&self, id: u32) -> Result<usize> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM users WHERE id = ?1", [id])?))
    }

    // -- Posts --

    pub fn create_post(&self, post: &NewPost<'_>) -> Result<PostRow> {
        self.with_conn(|conn| {
            let id: u64 = conn.query_row(
                "INSERT INTO posts (title, content, author_id) VALUES (?1, ?2, ?3) RETURNING id",
                rusqlite::params![post.title, post.content, post.author_id],
                |row| row.get(0),
            )?;
            query_post_by_id(conn, id)
        })
    }

    /// Newest first.
    pub fn find_all_posts(&self, limit: u32) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{POST_SELECT} ORDER BY p.id DESC LIMIT ?1"))?;
            let rows = stmt
                .query_map([limit], map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn find_post_by_id(&self, id: u64) -> Result<PostRow> {
        self.with_conn(|conn| query_post_by_id(conn, id))
    }

    pub fn update_post(&self, id: u64, patch: &PostPatch<'_>) -> Result<PostRow> {
        self.with_conn(|conn| {
            let id: u64 = conn.query_row(
                "UPDATE posts
                 SET title = ?1, content = ?2, updated_at = datetime('now')
                 WHERE id = ?3
                 RETURNING id",
                rusqlite::params![patch.title, patch.content, id],
                |row| row.get(0),
            )?;
            query_post_by_id(conn, id)
        })
    }

    /// Only removes the post when `requester_id` is its author. Returns the
    /// number of rows removed.
    pub fn delete_post(&self, id: u64, requester_id: u32) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM posts WHERE id = ?1 AND author_id = ?2",
                rusqlite::params![id, requester_id],
            )?)
        })
    }

    // -- Maintenance --

    /// Remove every user and post and restart id sequences.
    pub fn reset(&self) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute_batch(
                "
                DELETE FROM posts;
                DELETE FROM users;
                DELETE FROM sqlite_sequence WHERE name IN ('users', 'posts');
                ",
            )?;
            tx.commit()?;
            Ok(())
        })
    }
}

fn query_post_by_id(conn: &Connection, id: u64) -> Result<PostRow> {
    let row = conn.query_row(&format!("{POST_SELECT} WHERE p.id = ?1"), [id], map_post)?;
    Ok(row)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    map_user_at(row, 0)
}

fn map_user_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(offset)?,
        nickname: row.get(offset + 1)?,
        email: row.get(offset + 2)?,
        password: row.get(offset + 3)?,
        created_at: row.get(offset + 4)?,
        updated_at: row.get(offset + 5)?,
    })
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        author_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        author: map_user_at(row, 6)?,
    })
}
