//! Seed data for the blog mapping.
//!
//! Users: Bob (enabled), Mark (enabled, no email), James (disabled).
//! Posts: "Rust tips" by Bob, "Cooking" by James, "Orphan" without author.
//! Comments: two on "Rust tips" (Mark, James), one on "Cooking" (Bob).

use tessera::testing::InMemoryDatabase;
use tessera::{Record, Value};

use crate::blog_schema::{init_logging, shared_registry};

pub const BOB: i64 = 1;
pub const MARK: i64 = 2;
pub const JAMES: i64 = 3;

pub const RUST_TIPS: i64 = 1;
pub const COOKING: i64 = 2;
pub const ORPHAN: i64 = 3;

fn user(id: i64) -> Record {
    Record::new("User").with("UserId", id)
}

pub fn seeded_database() -> InMemoryDatabase {
    init_logging();
    let mut db = InMemoryDatabase::new(shared_registry());

    let users = [
        Record::new("User")
            .with("Username", "Bob")
            .with("EmailAddress", "bob@example.com")
            .with("IsEnabled", true),
        Record::new("User").with("Username", "Mark").with("IsEnabled", true),
        Record::new("User")
            .with("Username", "James")
            .with("EmailAddress", "james@example.com")
            .with("IsEnabled", false),
    ];
    for record in &users {
        db.insert(record).unwrap();
    }

    let posts = [
        Record::new("Post")
            .with("Title", "Rust tips")
            .with("Content", "Borrow wisely")
            .with("Author", user(BOB)),
        Record::new("Post").with("Title", "Cooking").with("Author", user(JAMES)),
        Record::new("Post").with("Title", "Orphan").with("Author", Value::Null),
    ];
    for record in &posts {
        db.insert(record).unwrap();
    }

    let comments = [
        ("great rust", RUST_TIPS, MARK),
        ("meh", RUST_TIPS, JAMES),
        ("yum", COOKING, BOB),
    ];
    for (body, post, author) in comments {
        db.insert(
            &Record::new("Comment")
                .with("Body", body)
                .with("Post", post)
                .with("Author", user(author)),
        )
        .unwrap();
    }
    db
}

pub fn texts(records: &[Record], property: &str) -> Vec<String> {
    records
        .iter()
        .map(|r| {
            r.get(property)
                .and_then(Value::as_text)
                .unwrap_or("<null>")
                .to_string()
        })
        .collect()
}
