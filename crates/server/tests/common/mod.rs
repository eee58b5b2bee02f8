#![allow(dead_code)]

use linkline_server::models::NewUser;
use linkline_server::store::Database;
use tempfile::TempDir;

pub const ALICE: &str = "alice@example.com";
pub const BOB: &str = "bob@example.com";
pub const CAROL: &str = "carol@example.com";
pub const DAVE: &str = "dave@example.com";

/// Fresh database in a temp dir. Keep the TempDir alive for the test.
pub async fn open_db() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let url = database_url(&dir);
    let db = Database::open(&url, 5).await.unwrap();
    (dir, db)
}

pub fn database_url(dir: &TempDir) -> String {
    format!("sqlite:{}", dir.path().join("linkline.sqlite").display())
}

pub fn display_name(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    let mut chars = local.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub async fn seed_users(db: &Database, emails: &[&str]) {
    for email in emails {
        db.users()
            .create(NewUser::new(*email, display_name(email), "Engineer"))
            .await
            .unwrap();
    }
}
