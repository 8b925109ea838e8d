//! Inserts, saves, updates and deletes: generated SQL alongside evaluator effects

#[cfg(test)]
mod modification_tests {
    use tessera::query::{path, DeleteQuery, Record, SelectQuery, UpdateQuery, Value};
    use tessera::sql::TranslationError;
    use tessera::{Engine, EngineConfig, Error};

    use crate::blog_data::{seeded_database, texts, BOB, COOKING, RUST_TIPS};
    use crate::blog_schema::{blog_mapping, sql_server};

    /// The database key is written back into the inserted entity
    #[test]
    fn test_generated_key_is_assigned() {
        let mut db = seeded_database();
        let mut user = Record::new("User").with("Username", "Eve").with("IsEnabled", true);

        let statements = sql_server().translate_insert(std::slice::from_ref(&user)).unwrap();
        let statement = &statements[0];
        assert_eq!(statement.id_sql.as_deref(), Some("SELECT CAST(SCOPE_IDENTITY() as int) id"));

        let key = db.insert(&user).unwrap();
        statement.assign_generated_key(&mut user, key);
        assert_eq!(user.get("UserId"), Some(&Value::Int(4)));
    }

    #[test]
    fn test_update_through_relationship() {
        let mut db = seeded_database();
        let query = UpdateQuery::new("Post")
            .set("Title", "Hidden")
            .filter(path("Author.IsEnabled").eq(false));

        let result = sql_server().translate_update(&query).unwrap();
        assert_eq!(
            result.sql,
            "update [Posts] set [Title] = @p_1 where [PostId] in (select t.[PostId] from [Posts] as t \
             left join [Users] as t_1 on t.[AuthorId] = t_1.[UserId] where t_1.[IsEnabled] = @p_2)"
        );
        assert_eq!(
            result.parameters.values(),
            &[Value::Text("Hidden".into()), Value::Bool(false)]
        );

        assert_eq!(db.update(&query).unwrap(), 1);
        let hidden = db
            .query(&SelectQuery::new("Post").filter(path("Title").eq("Hidden")))
            .unwrap();
        assert_eq!(hidden[0].get("PostId"), Some(&Value::Int(COOKING)));
    }

    #[test]
    fn test_assignments_are_validated() {
        let mut db = seeded_database();
        let query = UpdateQuery::new("User").set("UserId", 9);
        for err in [
            sql_server().translate_update(&query).unwrap_err(),
            db.update(&query).unwrap_err(),
        ] {
            assert!(matches!(
                err,
                Error::Translation(TranslationError::InvalidAssignment { .. })
            ));
        }
    }

    #[test]
    fn test_save_replaces_the_row() {
        let mut db = seeded_database();
        let post = Record::new("Post")
            .with("PostId", COOKING)
            .with("Title", "Baking")
            .with("Author", Record::new("User").with("UserId", BOB));

        let result = sql_server().translate_save(std::slice::from_ref(&post)).unwrap();
        assert_eq!(result.parameters.len(), 4);
        assert_eq!(db.save(&post).unwrap(), 1);

        let by_bob = db
            .query(
                &SelectQuery::new("Post")
                    .filter(path("Author.Username").eq("Bob"))
                    .order_by("PostId"),
            )
            .unwrap();
        assert_eq!(texts(&by_bob, "Title"), vec!["Rust tips", "Baking"]);
    }

    #[test]
    fn test_delete_through_relationship() {
        let mut db = seeded_database();
        let query = DeleteQuery::new("Comment").filter(path("Post.Title").eq("Rust tips"));
        let result = sql_server().translate_delete(&query).unwrap();
        assert!(result.sql.starts_with("delete from [Comments] where [CommentId] in (select"));

        assert_eq!(db.delete(&query).unwrap(), 2);
        assert_eq!(texts(db.rows("Comment"), "Body"), vec!["yum"]);
    }

    #[test]
    fn test_delete_without_children() {
        let mut db = seeded_database();
        let query = DeleteQuery::new("User").filter(!path("Posts").any_exists());
        assert_eq!(db.delete(&query).unwrap(), 1);
        assert_eq!(texts(db.rows("User"), "Username"), vec!["Bob", "James"]);
    }

    #[test]
    fn test_delete_by_keys() {
        let mut db = seeded_database();
        let keys = [Value::Int(RUST_TIPS), Value::Int(42)];
        let result = sql_server().translate_delete_by_keys("Post", &keys).unwrap();
        assert_eq!(result.sql, "delete from [Posts] where [PostId] in (@p_1, @p_2)");
        assert_eq!(db.delete_by_keys("Post", &keys).unwrap(), 1);
        assert_eq!(db.rows("Post").len(), 2);
    }

    /// Conventions from the engine configuration reach every statement
    #[test]
    fn test_engine_from_yaml_configuration() {
        let config = EngineConfig::from_yaml_str(
            "dialect: mysql\npluralize_table_names: false\nauto_generated_keys: false\n",
        )
        .unwrap();
        let engine = Engine::from_config(&config, &blog_mapping()).unwrap();

        let count = engine
            .translate_count(&SelectQuery::new("User").filter(path("IsEnabled").eq(true)))
            .unwrap();
        assert_eq!(count.sql, "select count(1) from `User` as t where t.`IsEnabled` = @p_1");

        let user = Record::new("User").with("UserId", 7).with("Username", "Zed");
        let statements = engine.translate_insert(&[user]).unwrap();
        assert_eq!(
            statements[0].sql,
            "insert into `User` (`UserId`, `Username`, `EmailAddress`, `IsEnabled`) values (@p_1, @p_2, @p_3, @p_4)"
        );
        assert!(statements[0].id_sql.is_none());
    }
}
