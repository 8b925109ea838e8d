//! Unit tests for YAML mapping definitions and registry validation

#[cfg(test)]
mod mapping_config_tests {
    use std::io::Write;

    use tessera::mapping::{
        Convention, DbType, MappingConfig, MappingError, MappingRegistry, RelationshipKind,
    };

    use crate::blog_schema::{blog_mapping, BLOG_MAPPING};

    fn build(yaml: &str) -> Result<MappingRegistry, MappingError> {
        let config = MappingConfig::from_yaml_str(yaml)?;
        MappingRegistry::build(&config, &Convention::default())
    }

    /// Conventions fill in table names, keys and reference columns
    #[test]
    fn test_blog_mapping_conventions() {
        let registry = build(BLOG_MAPPING).unwrap();

        let post = registry.resolve("Post").unwrap();
        assert_eq!(post.table, "Posts");
        assert_eq!(post.primary_key().name, "PostId");
        assert!(post.is_primary_key_auto_generated());

        let author = post.column("Author").unwrap();
        assert_eq!(author.db_name, "AuthorId");
        assert_eq!(author.relationship, RelationshipKind::ManyToOne);
        assert_eq!(author.db_type, DbType::Int32);
        assert!(author.is_nullable);

        let comments = post.column("Comments").unwrap();
        assert_eq!(comments.relationship, RelationshipKind::OneToMany);
        assert_eq!(comments.child_column(&registry).unwrap().name, "Post");

        let defaults: Vec<&str> = post
            .default_select_columns()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(defaults, vec!["PostId", "Title", "Author"]);
    }

    #[test]
    fn test_fetch_ids_follow_declaration_order() {
        let registry = build(BLOG_MAPPING).unwrap();
        let user = registry.resolve("User").unwrap();
        let ids: Vec<usize> = user.columns().iter().map(|c| c.fetch_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let first = build(BLOG_MAPPING).unwrap().fingerprint();
        let second = build(BLOG_MAPPING).unwrap().fingerprint();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);

        let renamed = BLOG_MAPPING.replace("name: Body", "name: Text");
        assert_ne!(build(&renamed).unwrap().fingerprint(), first);
    }

    #[test]
    fn test_mapping_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BLOG_MAPPING.as_bytes()).unwrap();

        let config = MappingConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.entities.len(), blog_mapping().entities.len());

        let missing = MappingConfig::from_yaml_file(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(MappingError::ConfigReadError { .. })));
    }

    #[test]
    fn test_unknown_referenced_entity() {
        let yaml = r#"
entities:
  - name: Post
    properties:
      - name: PostId
        type: int32
      - name: Author
        references: Person
"#;
        assert!(matches!(
            build(yaml),
            Err(MappingError::UnknownEntity { ref entity }) if entity == "Person"
        ));
    }

    /// Two references back to the owner make the collection ambiguous
    #[test]
    fn test_ambiguous_child_column() {
        let yaml = r#"
entities:
  - name: User
    properties:
      - name: UserId
        type: int32
      - name: Reviews
        collection_of: Review
  - name: Review
    properties:
      - name: ReviewId
        type: int32
      - name: Reviewer
        references: User
      - name: Subject
        references: User
"#;
        assert!(matches!(
            build(yaml),
            Err(MappingError::AmbiguousChildColumn { .. })
        ));

        let resolved = yaml.replace(
            "collection_of: Review",
            "collection_of: Review\n        maps_to: Reviewer",
        );
        let registry = build(&resolved).unwrap();
        let reviews = registry.resolve("User").unwrap().column("Reviews").unwrap();
        assert_eq!(reviews.child_column(&registry).unwrap().name, "Reviewer");
    }

    #[test]
    fn test_collection_without_back_reference() {
        let yaml = r#"
entities:
  - name: User
    properties:
      - name: UserId
        type: int32
      - name: Tags
        collection_of: Tag
  - name: Tag
    properties:
      - name: TagId
        type: int32
"#;
        assert!(matches!(
            build(yaml),
            Err(MappingError::MissingChildColumn { .. })
        ));
    }

    #[test]
    fn test_property_needs_exactly_one_kind() {
        let yaml = r#"
entities:
  - name: Tag
    properties:
      - name: TagId
        type: int32
      - name: Label
"#;
        assert!(build(yaml).is_err());
    }

    #[test]
    fn test_bad_yaml_is_a_parse_error() {
        assert!(matches!(
            MappingConfig::from_yaml_str("entities: [name: ["),
            Err(MappingError::ConfigParseError { .. })
        ));
    }

    #[test]
    fn test_resolve_path_walks_references() {
        let registry = build(BLOG_MAPPING).unwrap();
        let column = registry
            .resolve_path("Comment", "Post.Author.Username")
            .unwrap();
        assert_eq!(column.entity(), "User");
        assert!(matches!(
            registry.resolve_path("Comment", "Post.Nope"),
            Err(MappingError::UnknownProperty { .. })
        ));
    }
}
