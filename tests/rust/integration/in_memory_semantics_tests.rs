//! Query semantics of the in-memory evaluator on the seeded blog

#[cfg(test)]
mod in_memory_semantics_tests {
    use tessera::query::{path, SelectQuery, Value};
    use tessera::sql::TranslationError;
    use tessera::Error;

    use crate::blog_data::{seeded_database, texts, BOB, JAMES, ORPHAN};

    /// The earliest ordering is the primary sort key
    #[test]
    fn test_ordering_follows_call_order() {
        let db = seeded_database();
        let users = db
            .query(
                &SelectQuery::new("User")
                    .order_by("IsEnabled")
                    .order_by_descending("Username"),
            )
            .unwrap();
        assert_eq!(texts(&users, "Username"), vec!["James", "Mark", "Bob"]);
    }

    #[test]
    fn test_empty_membership_matches_nothing() {
        let db = seeded_database();
        let none = SelectQuery::new("User").filter(path("UserId").is_in(Vec::<i64>::new()));
        assert_eq!(db.count(&none).unwrap(), 0);

        let enabled = path("IsEnabled").eq(true);
        let either = SelectQuery::new("User")
            .filter(enabled.clone().or(path("Username").is_in(Vec::<&str>::new())));
        let only = SelectQuery::new("User").filter(enabled);
        assert_eq!(db.query(&either).unwrap(), db.query(&only).unwrap());
    }

    /// Comparisons against a null column are unknown, and so is their negation
    #[test]
    fn test_null_values_are_unknown() {
        let db = seeded_database();
        let not_bob = SelectQuery::new("User").filter(path("EmailAddress").ne("bob@example.com"));
        assert_eq!(texts(&db.query(&not_bob).unwrap(), "Username"), vec!["James"]);

        let negated = SelectQuery::new("User").filter(!path("EmailAddress").eq("bob@example.com"));
        assert_eq!(texts(&db.query(&negated).unwrap(), "Username"), vec!["James"]);

        let missing = SelectQuery::new("User").filter(path("EmailAddress").is_null());
        assert_eq!(texts(&db.query(&missing).unwrap(), "Username"), vec!["Mark"]);
    }

    /// A missing reference makes every value read through it null
    #[test]
    fn test_navigation_through_missing_reference() {
        let db = seeded_database();
        let by_bob = SelectQuery::new("Post").filter(path("Author.Username").eq("Bob"));
        assert_eq!(texts(&db.query(&by_bob).unwrap(), "Title"), vec!["Rust tips"]);

        let not_enabled = SelectQuery::new("Post").filter(!path("Author.IsEnabled").eq(true));
        assert_eq!(texts(&db.query(&not_enabled).unwrap(), "Title"), vec!["Cooking"]);

        let authorless = db
            .query(&SelectQuery::new("Post").filter(path("Author").is_null()))
            .unwrap();
        assert_eq!(texts(&authorless, "Title"), vec!["Orphan"]);
        assert_eq!(authorless[0].get("PostId"), Some(&Value::Int(ORPHAN)));
    }

    #[test]
    fn test_any_over_collections() {
        let db = seeded_database();
        let commented_by_mark = SelectQuery::new("User").filter(
            path("Posts").any(path("Comments").any(path("Author.Username").eq("Mark"))),
        );
        assert_eq!(texts(&db.query(&commented_by_mark).unwrap(), "Username"), vec!["Bob"]);

        let without_posts = SelectQuery::new("User").filter(!path("Posts").any_exists());
        assert_eq!(texts(&db.query(&without_posts).unwrap(), "Username"), vec!["Mark"]);

        let commented = SelectQuery::new("Post").filter(path("Comments").any_exists());
        assert_eq!(db.count(&commented).unwrap(), 2);
    }

    #[test]
    fn test_text_matching_is_case_sensitive() {
        let db = seeded_database();
        let rust = SelectQuery::new("Post").filter(path("Title").contains("Rust"));
        assert_eq!(db.count(&rust).unwrap(), 1);
        let lower = SelectQuery::new("Post").filter(path("Title").starts_with("rust"));
        assert_eq!(db.count(&lower).unwrap(), 0);
    }

    /// A page holds rows S+1 through S+T of the ordered result
    #[test]
    fn test_pages_are_windows_of_the_ordered_result() {
        let db = seeded_database();
        let all = texts(
            &db.query(&SelectQuery::new("User").order_by("Username")).unwrap(),
            "Username",
        );
        assert_eq!(all, vec!["Bob", "James", "Mark"]);

        for skip in 0..4 {
            for take in 1..4 {
                let page = db
                    .query(&SelectQuery::new("User").order_by("Username").skip(skip).take(take))
                    .unwrap();
                let expected: Vec<String> = all
                    .iter()
                    .skip(skip as usize)
                    .take(take as usize)
                    .cloned()
                    .collect();
                assert_eq!(texts(&page, "Username"), expected, "skip {} take {}", skip, take);
            }
        }
    }

    /// Without an explicit order a page is taken in primary key order
    #[test]
    fn test_paging_defaults_to_key_order() {
        let db = seeded_database();
        let page = db.query(&SelectQuery::new("User").skip(2)).unwrap();
        assert_eq!(texts(&page, "Username"), vec!["James"]);
        assert_eq!(page[0].get("UserId"), Some(&JAMES.into()));
    }

    #[test]
    fn test_fetched_and_stub_references() {
        let db = seeded_database();
        let posts = db
            .query(&SelectQuery::new("Post").fetch("Author").filter(path("PostId").eq(1)))
            .unwrap();
        let author = posts[0].reference("Author").unwrap();
        assert_eq!(author.get("Username"), Some(&"Bob".into()));

        let comments = db
            .query(&SelectQuery::new("Comment").filter(path("Body").eq("yum")))
            .unwrap();
        let stub = comments[0].reference("Author").unwrap();
        assert_eq!(stub.get("UserId"), Some(&BOB.into()));
        assert_eq!(stub.get("Username"), None);
    }

    #[test]
    fn test_fetched_collections() {
        let db = seeded_database();
        let users = db
            .query(&SelectQuery::new("User").fetch_many("Posts").then_fetch("Comments").order_by("UserId"))
            .unwrap();
        let bob_posts = users[0].collection("Posts").unwrap();
        assert_eq!(texts(bob_posts, "Title"), vec!["Rust tips"]);
        assert_eq!(texts(bob_posts[0].collection("Comments").unwrap(), "Body"), vec!["great rust", "meh"]);
        assert_eq!(users[1].collection("Posts").unwrap().len(), 0);
    }

    #[test]
    fn test_invalid_queries() {
        let db = seeded_database();
        assert!(matches!(
            db.query(&SelectQuery::new("Post").filter(path("Nope").eq(1))),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            db.query(&SelectQuery::new("Post").filter(path("Comments.Body").eq("x"))),
            Err(Error::Translation(TranslationError::CollectionNavigation { .. }))
        ));
        assert!(matches!(
            db.query(&SelectQuery::new("User").fetch_many("Posts").take(1)),
            Err(Error::Translation(TranslationError::PagingWithCollectionFetch { .. }))
        ));
        assert!(matches!(
            db.query(&SelectQuery::new("User").skip(-1)),
            Err(Error::Argument(_))
        ));
    }
}
