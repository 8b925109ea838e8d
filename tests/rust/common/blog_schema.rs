//! Shared blog mapping used by the unit and integration targets.
//!
//! User 1-* Post 1-* Comment, with Comment also referencing its author.

use std::sync::Arc;

use tessera::{DialectKind, Engine, EngineConfig, MappingConfig};

pub const BLOG_MAPPING: &str = r#"
entities:
  - name: User
    properties:
      - name: UserId
        type: int32
      - name: Username
        type: string
        length: 100
      - name: EmailAddress
        type: string
      - name: IsEnabled
        type: boolean
      - name: Posts
        collection_of: Post
    indexes:
      - columns: [EmailAddress]
        unique: true
  - name: Post
    properties:
      - name: PostId
        type: int32
      - name: Title
        type: string
      - name: Content
        type: string
        max_length: true
        excluded_by_default: true
      - name: Author
        references: User
      - name: Comments
        collection_of: Comment
  - name: Comment
    properties:
      - name: CommentId
        type: int32
      - name: Body
        type: string
      - name: Post
        references: Post
      - name: Author
        references: User
"#;

pub fn blog_mapping() -> MappingConfig {
    MappingConfig::from_yaml_str(BLOG_MAPPING).expect("blog mapping should parse")
}

pub fn engine(dialect: DialectKind) -> Engine {
    let config = EngineConfig {
        dialect,
        ..Default::default()
    };
    Engine::from_config(&config, &blog_mapping()).expect("blog mapping should build")
}

pub fn sql_server() -> Engine {
    engine(DialectKind::SqlServer)
}

pub fn shared_registry() -> Arc<tessera::MappingRegistry> {
    sql_server().shared_registry()
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
