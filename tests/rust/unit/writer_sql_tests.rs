//! Unit tests for statement writers across dialects

#[cfg(test)]
mod writer_sql_tests {
    use test_case::test_case;

    use tessera::query::{path, DeleteQuery, Record, SelectQuery, UpdateQuery, Value};
    use tessera::sql::TranslationError;
    use tessera::{DialectKind, Error};

    use crate::blog_schema::{engine, sql_server};

    #[test_case(DialectKind::SqlServer, "select top (10) t.[UserId], t.[Username], t.[EmailAddress], t.[IsEnabled] from [Users] as t order by t.[Username] asc" ; "sql server top")]
    #[test_case(DialectKind::MySql, "select t.`UserId`, t.`Username`, t.`EmailAddress`, t.`IsEnabled` from `Users` as t order by t.`Username` asc limit 10" ; "mysql limit")]
    #[test_case(DialectKind::Ansi, "select t.\"UserId\", t.\"Username\", t.\"EmailAddress\", t.\"IsEnabled\" from \"Users\" as t order by t.\"Username\" asc fetch first 10 rows only" ; "ansi fetch first")]
    fn test_take(dialect: DialectKind, expected: &str) {
        let result = engine(dialect)
            .translate_select(&SelectQuery::new("User").order_by("Username").take(10))
            .unwrap();
        assert_eq!(result.sql, expected);
    }

    /// Window bounds past i64::MAX are still written exactly
    #[test]
    fn test_window_near_the_integer_limit() {
        let result = sql_server()
            .translate_select(
                &SelectQuery::new("User")
                    .order_by("Username")
                    .skip(i64::MAX - 1)
                    .take(10),
            )
            .unwrap();
        assert!(result
            .sql
            .ends_with("where pagetable.RowNum between 9223372036854775807 and 9223372036854775816 order by pagetable.RowNum"));
    }

    #[test]
    fn test_windowed_paging_keeps_parameters_in_place() {
        let result = sql_server()
            .translate_select(
                &SelectQuery::new("Post")
                    .filter(path("Author.Username").eq("bob"))
                    .order_by_descending("Title")
                    .skip(20)
                    .take(10),
            )
            .unwrap();
        assert_eq!(
            result.sql,
            "select * from (select ROW_NUMBER() OVER (order by t.[Title] desc) as RowNum, \
             t.[PostId], t.[Title], t.[AuthorId] from [Posts] as t \
             left join [Users] as t_1 on t.[AuthorId] = t_1.[UserId] where t_1.[Username] = @p_1) as pagetable \
             where pagetable.RowNum between 21 and 30 order by pagetable.RowNum"
        );
        assert_eq!(result.parameters.values(), &[Value::Text("bob".into())]);
        assert_eq!(result.fetch_plan.leading_columns, 1);
    }

    #[test]
    fn test_fetch_projection_aliases_repeated_columns() {
        let result = sql_server()
            .translate_select(
                &SelectQuery::new("Comment")
                    .fetch("Post.Author")
                    .fetch("Author")
                    .include("Post.Content"),
            )
            .unwrap();
        assert_eq!(
            result.sql,
            "select t.[CommentId], t.[Body], t.[PostId], t.[AuthorId], \
             t_1.[PostId] as [t_1_PostId], t_1.[Title], t_1.[Content], t_1.[AuthorId] as [t_1_AuthorId], \
             t_2.[UserId], t_2.[Username], t_2.[EmailAddress], t_2.[IsEnabled], \
             t_3.[UserId] as [t_3_UserId], t_3.[Username] as [t_3_Username], \
             t_3.[EmailAddress] as [t_3_EmailAddress], t_3.[IsEnabled] as [t_3_IsEnabled] \
             from [Comments] as t \
             left join [Posts] as t_1 on t.[PostId] = t_1.[PostId] \
             left join [Users] as t_2 on t_1.[AuthorId] = t_2.[UserId] \
             left join [Users] as t_3 on t.[AuthorId] = t_3.[UserId]"
        );
        assert_eq!(result.fetch_plan.segments.len(), 4);
    }

    #[test]
    fn test_paging_a_collection_fetch_fails() {
        let err = sql_server()
            .translate_select(&SelectQuery::new("User").fetch_many("Posts").skip(1))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Translation(TranslationError::PagingWithCollectionFetch { .. })
        ));
    }

    #[test]
    fn test_insert_batch() {
        let users = [
            Record::new("User").with("Username", "bob").with("IsEnabled", true),
            Record::new("User").with("Username", "mark").with("IsEnabled", false),
        ];
        let statements = sql_server().translate_insert(&users).unwrap();
        assert_eq!(statements.len(), 2);
        for statement in &statements {
            assert_eq!(
                statement.sql,
                "insert into [Users] ([Username], [EmailAddress], [IsEnabled]) values (@p_1, @p_2, @p_3)"
            );
            assert_eq!(statement.key_property.as_deref(), Some("UserId"));
        }
        assert_eq!(statements[1].parameters.get("@p_1"), Some(&Value::Text("mark".into())));
    }

    #[test]
    fn test_save_and_update() {
        let engine = sql_server();
        let post = Record::new("Post")
            .with("PostId", 4)
            .with("Title", "Edited")
            .with("Author", Record::new("User").with("UserId", 2));
        let result = engine.translate_save(&[post]).unwrap();
        assert_eq!(
            result.sql,
            "update [Posts] set [Title] = @p_1, [Content] = @p_2, [AuthorId] = @p_3 where [PostId] = @p_4"
        );
        assert_eq!(
            result.parameters.values(),
            &[Value::Text("Edited".into()), Value::Null, Value::Int(2), Value::Int(4)]
        );

        let result = engine
            .translate_update(
                &UpdateQuery::new("Post")
                    .set("Title", "Archived")
                    .filter(path("PostId").lt(100)),
            )
            .unwrap();
        assert_eq!(result.sql, "update [Posts] set [Title] = @p_1 where [PostId] < @p_2");
    }

    /// An `any` in a single-table update correlates with the table name
    #[test]
    fn test_update_with_any_stays_single_table() {
        let result = sql_server()
            .translate_update(
                &UpdateQuery::new("User")
                    .set("IsEnabled", false)
                    .filter(!path("Posts").any_exists()),
            )
            .unwrap();
        assert_eq!(
            result.sql,
            "update [Users] set [IsEnabled] = @p_1 where not (exists (select 1 from [Posts] as s1 \
             where s1.[AuthorId] = [Users].[UserId]))"
        );
    }

    #[test]
    fn test_delete_by_keys() {
        let engine = sql_server();
        let result = engine.translate_delete_by_keys("Post", &[Value::Int(1)]).unwrap();
        assert_eq!(result.sql, "delete from [Posts] where [PostId] in (@p_1)");

        let result = engine
            .translate_delete_by_keys("Post", &[Value::Int(1), Value::Int(2)])
            .unwrap();
        assert_eq!(result.sql, "delete from [Posts] where [PostId] in (@p_1, @p_2)");

        assert!(matches!(
            engine.translate_delete_by_keys("Post", &[]),
            Err(Error::Argument(_))
        ));
    }

    #[test_case(DialectKind::SqlServer, "delete from [Comments] where [CommentId] in (select t.[CommentId] from [Comments] as t left join [Posts] as t_1 on t.[PostId] = t_1.[PostId] where t_1.[Title] = @p_1)" ; "sql server")]
    #[test_case(DialectKind::MySql, "delete from `Comments` where `CommentId` in (select * from (select t.`CommentId` from `Comments` as t left join `Posts` as t_1 on t.`PostId` = t_1.`PostId` where t_1.`Title` = @p_1) as keys_to_modify)" ; "mysql")]
    fn test_delete_through_relationship(dialect: DialectKind, expected: &str) {
        let result = engine(dialect)
            .translate_delete(&DeleteQuery::new("Comment").filter(path("Post.Title").eq("spam")))
            .unwrap();
        assert_eq!(result.sql, expected);
        assert_eq!(result.parameters.len(), 1);
    }

    #[test]
    fn test_count() {
        let result = sql_server()
            .translate_count(&SelectQuery::new("Post").filter(path("Comments").any_exists()))
            .unwrap();
        assert_eq!(
            result.sql,
            "select count(1) from [Posts] as t where exists (select 1 from [Comments] as s1 where s1.[PostId] = t.[PostId])"
        );
    }

    #[test]
    fn test_create_script() {
        let script = sql_server().create_script().unwrap();
        assert_eq!(
            script,
            vec![
                "create table [Comments] ([CommentId] int not null identity(1,1) primary key, \
                 [Body] nvarchar(255) null, [PostId] int null, [AuthorId] int null)",
                "create table [Posts] ([PostId] int not null identity(1,1) primary key, \
                 [Title] nvarchar(255) null, [Content] nvarchar(max) null, [AuthorId] int null)",
                "create table [Users] ([UserId] int not null identity(1,1) primary key, \
                 [Username] nvarchar(100) null, [EmailAddress] nvarchar(255) null, [IsEnabled] bit not null default (0))",
                "alter table [Comments] add constraint [fk_Comment_Post_Post] foreign key ([PostId]) references [Posts]([PostId])",
                "alter table [Comments] add constraint [fk_Comment_User_Author] foreign key ([AuthorId]) references [Users]([UserId])",
                "alter table [Posts] add constraint [fk_Post_User_Author] foreign key ([AuthorId]) references [Users]([UserId])",
                "create unique index [idx_User_EmailAddress] on [Users] ([EmailAddress]) where [EmailAddress] is not null",
            ]
        );
    }

    #[test]
    fn test_unsupported_dialect_operations() {
        let ansi = engine(DialectKind::Ansi);
        assert!(matches!(
            ansi.check_database_exists("blog"),
            Err(Error::Translation(TranslationError::Dialect(_)))
        ));
        assert!(matches!(
            ansi.translate_select(&SelectQuery::new("User").for_update()),
            Err(Error::Translation(TranslationError::Dialect(_)))
        ));
        assert!(ansi.drop_script().is_err());
        assert!(sql_server().check_database_exists("blog").is_ok());
    }
}
