//! Unit tests for predicate translation through the select writer

#[cfg(test)]
mod predicate_sql_tests {
    use tessera::query::{literal, path, Expr, Record, SelectQuery, Value};
    use tessera::sql::TranslationError;
    use tessera::Error;

    use crate::blog_schema::sql_server;

    const POSTS: &str = "select t.[PostId], t.[Title], t.[AuthorId] from [Posts] as t";

    /// SQL after the select list and the parameters, for a post query with one filter
    fn post_filter(predicate: Expr) -> (String, Vec<Value>) {
        let result = sql_server()
            .translate_select(&SelectQuery::new("Post").filter(predicate))
            .unwrap();
        let filter = result
            .sql
            .strip_prefix(POSTS)
            .unwrap_or(&result.sql)
            .to_string();
        (filter, result.parameters.into_values())
    }

    #[test]
    fn test_simple_comparison() {
        let (sql, params) = post_filter(path("Title").eq("Hello"));
        assert_eq!(sql, " where t.[Title] = @p_1");
        assert_eq!(params, vec![Value::Text("Hello".into())]);
    }

    /// A literal on the left flips the operator so the column stays on the left
    #[test]
    fn test_literal_on_the_left() {
        let (sql, params) = post_filter(literal(5).lt(path("PostId")));
        assert_eq!(sql, " where t.[PostId] > @p_1");
        assert_eq!(params, vec![Value::Int(5)]);
    }

    #[test]
    fn test_null_comparisons() {
        let (sql, params) = post_filter(path("Author").is_null());
        assert_eq!(sql, " where t.[AuthorId] is null");
        assert!(params.is_empty());

        let (sql, _) = post_filter(path("Title").ne(Value::Null));
        assert_eq!(sql, " where t.[Title] is not null");

        let err = sql_server()
            .translate_select(&SelectQuery::new("Post").filter(path("Title").gt(Value::Null)))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Translation(TranslationError::UnsupportedExpression(_))
        ));
    }

    /// Entities compare by primary key against the foreign key column
    #[test]
    fn test_entity_comparison_uses_key() {
        let author = Record::new("User").with("UserId", 3).with("Username", "bob");
        let (sql, params) = post_filter(path("Author").eq(author));
        assert_eq!(sql, " where t.[AuthorId] = @p_1");
        assert_eq!(params, vec![Value::Int(3)]);
    }

    /// Reading the referenced key reads the foreign key: no join
    #[test]
    fn test_reference_key_shortcut() {
        let (sql, _) = post_filter(path("Author.UserId").eq(3));
        assert_eq!(sql, " where t.[AuthorId] = @p_1");
    }

    #[test]
    fn test_membership() {
        let (sql, params) = post_filter(path("PostId").is_in([1, 2, 3]));
        assert_eq!(sql, " where t.[PostId] in (@p_1, @p_2, @p_3)");
        assert_eq!(params, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    /// An empty list matches nothing and binds nothing
    #[test]
    fn test_empty_membership() {
        let (sql, params) = post_filter(path("PostId").is_in(Vec::<i32>::new()));
        assert_eq!(sql, " where 1 = 0");
        assert!(params.is_empty());

        let (sql, params) =
            post_filter(path("Title").eq("a").or(path("Author.Username").is_in(Vec::<&str>::new())));
        assert_eq!(sql, " where (t.[Title] = @p_1 or 1 = 0)");
        assert_eq!(params.len(), 1);

        let err = sql_server()
            .translate_select(
                &SelectQuery::new("Post").filter(path("Nope").is_in(Vec::<i32>::new())),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    /// Placeholders are numbered in the order they appear in the text
    #[test]
    fn test_parameter_order_follows_text() {
        let predicate = path("Title")
            .starts_with("a")
            .and(path("PostId").ge(10).or(path("Author.Username").ends_with("z")));
        let (sql, params) = post_filter(predicate);
        assert_eq!(
            sql,
            " left join [Users] as t_1 on t.[AuthorId] = t_1.[UserId] \
             where (t.[Title] like @p_1 and (t.[PostId] >= @p_2 or t_1.[Username] like @p_3))"
        );
        assert_eq!(
            params,
            vec![
                Value::Text("a%".into()),
                Value::Int(10),
                Value::Text("%z".into())
            ]
        );
    }

    #[test]
    fn test_negation() {
        let (sql, _) = post_filter(!(path("Title").eq("a") & path("PostId").gt(1)));
        assert_eq!(sql, " where not (t.[Title] = @p_1 and t.[PostId] > @p_2)");

        let (sql, _) = post_filter(!path("Title").contains("x"));
        assert_eq!(sql, " where not (t.[Title] like @p_1)");
    }

    /// Each navigated reference joins once, whatever the number of uses
    #[test]
    fn test_nested_navigation_joins_once() {
        let result = sql_server()
            .translate_select(
                &SelectQuery::new("Comment")
                    .filter(path("Post.Author.Username").eq("bob"))
                    .filter(path("Post.Author.IsEnabled").eq(true))
                    .order_by("Post.Title"),
            )
            .unwrap();
        assert_eq!(
            result.sql,
            "select t.[CommentId], t.[Body], t.[PostId], t.[AuthorId] from [Comments] as t \
             left join [Posts] as t_1 on t.[PostId] = t_1.[PostId] \
             left join [Users] as t_2 on t_1.[AuthorId] = t_2.[UserId] \
             where t_2.[Username] = @p_1 and t_2.[IsEnabled] = @p_2 order by t_1.[Title] asc"
        );
    }

    #[test]
    fn test_any_is_a_correlated_exists() {
        let (sql, params) = post_filter(path("Comments").any(path("Body").contains("rust")));
        assert_eq!(
            sql,
            " where exists (select 1 from [Comments] as s1 where s1.[PostId] = t.[PostId] and s1.[Body] like @p_1)"
        );
        assert_eq!(params, vec![Value::Text("%rust%".into())]);

        let (sql, _) = post_filter(path("Comments").any_exists());
        assert_eq!(
            sql,
            " where exists (select 1 from [Comments] as s1 where s1.[PostId] = t.[PostId])"
        );
    }

    #[test]
    fn test_any_with_navigation_inside() {
        let result = sql_server()
            .translate_select(
                &SelectQuery::new("User")
                    .filter(path("Posts").any(path("Comments").any(path("Author.Username").eq("eve")))),
            )
            .unwrap();
        assert!(result.sql.ends_with(
            "where exists (select 1 from [Posts] as s1 where s1.[AuthorId] = t.[UserId] and \
             exists (select 1 from [Comments] as s2 left join [Users] as s2_1 on s2.[AuthorId] = s2_1.[UserId] \
             where s2.[PostId] = s1.[PostId] and s2_1.[Username] = @p_1))"
        ));
    }

    #[test]
    fn test_navigation_through_collection_is_rejected() {
        let err = sql_server()
            .translate_select(&SelectQuery::new("Post").filter(path("Comments.Body").eq("x")))
            .unwrap_err();
        assert_eq!(
            err,
            Error::Translation(TranslationError::CollectionNavigation {
                entity: "Post".into(),
                property: "Comments".into(),
            })
        );
    }

    #[test]
    fn test_boolean_property_as_predicate() {
        let result = sql_server()
            .translate_select(&SelectQuery::new("User").filter(!path("IsEnabled")))
            .unwrap();
        assert!(result.sql.ends_with(" where not (t.[IsEnabled] = @p_1)"));
        assert_eq!(result.parameters.values(), &[Value::Bool(true)]);
    }
}
