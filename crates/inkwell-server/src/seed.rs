use anyhow::Result;
use tracing::info;

use inkwell_auth::hash_password;
use inkwell_db::Database;
use inkwell_db::models::{NewPost, NewUser};

struct DemoEntry {
    nickname: &'static str,
    email: &'static str,
    password: &'static str,
    title: &'static str,
    content: &'static str,
}

const DEMO: &[DemoEntry] = &[
    DemoEntry {
        nickname: "Steve victor",
        email: "steven@mail.com",
        password: "p@ssw0rd",
        title: "Title 1",
        content: "Title Number 1",
    },
    DemoEntry {
        nickname: "Alex Morgan",
        email: "alex@mail.com",
        password: "p@ssM",
        title: "Title 2",
        content: "Title Number 2",
    },
];

/// Wipe users and posts, then load two demo users with one post each.
pub fn load(db: &Database) -> Result<()> {
    db.reset()?;

    for entry in DEMO {
        let password_hash = hash_password(entry.password)?;
        let user = db.create_user(&NewUser {
            nickname: entry.nickname,
            email: entry.email,
            password_hash: &password_hash,
        })?;
        db.create_post(&NewPost {
            title: entry.title,
            content: entry.content,
            author_id: user.id,
        })?;
    }

    info!("Seeded {} demo users and posts", DEMO.len());
    Ok(())
}
