//! Rebuilding object graphs from flattened rows
//!
//! Rows are produced by joining the seeded tables the way the generated SQL would,
//! then assembled with the select's fetch plan and compared with the evaluator.

#[cfg(test)]
mod fetch_assembly_tests {
    use tessera::mapping::{MappingRegistry, RelationshipKind};
    use tessera::query::{SelectQuery, Value};
    use tessera::sql::{FetchPlan, TranslationError};
    use tessera::testing::InMemoryDatabase;
    use tessera::Record;

    use crate::blog_data::{seeded_database, texts};
    use crate::blog_schema::{shared_registry, sql_server};

    /// Left-joins the stored rows along the plan's segments.
    fn flatten(
        registry: &MappingRegistry,
        db: &InMemoryDatabase,
        plan: &FetchPlan,
        roots: &[Record],
    ) -> Vec<Vec<Value>> {
        let mut rows = Vec::new();
        for root in roots {
            let stored = db
                .rows(&root.entity)
                .iter()
                .find(|row| {
                    let key = &plan.segments[0].columns[plan.segments[0].key].property;
                    row.get(key) == root.get(key)
                })
                .unwrap();

            let mut combos: Vec<Vec<Option<&Record>>> = vec![vec![Some(stored)]];
            for segment in &plan.segments[1..] {
                let parent = segment.parent.unwrap();
                let property = segment.property.as_deref().unwrap();
                let mut next = Vec::new();
                for combo in combos {
                    let related: Vec<&Record> = match combo[parent] {
                        None => Vec::new(),
                        Some(owner) => {
                            let map = registry.resolve(&owner.entity).unwrap();
                            let column = map.column(property).unwrap();
                            let target = registry.resolve(&segment.entity).unwrap();
                            let target_key = &target.primary_key().name;
                            if segment.relationship == RelationshipKind::OneToMany {
                                let child = &column.child_column(registry).unwrap().name;
                                let owner_key = owner.get(&map.primary_key().name);
                                db.rows(&segment.entity)
                                    .iter()
                                    .filter(|row| row.get(child) == owner_key)
                                    .collect()
                            } else {
                                db.rows(&segment.entity)
                                    .iter()
                                    .filter(|row| row.get(target_key) == owner.get(property))
                                    .collect()
                            }
                        }
                    };
                    if related.is_empty() {
                        let mut combo = combo.clone();
                        combo.push(None);
                        next.push(combo);
                    }
                    for row in related {
                        let mut combo = combo.clone();
                        combo.push(Some(row));
                        next.push(combo);
                    }
                }
                combos = next;
            }

            for combo in combos {
                let mut row = Vec::with_capacity(plan.width());
                for (segment, record) in plan.segments.iter().zip(combo) {
                    for column in &segment.columns {
                        row.push(
                            record
                                .and_then(|r| r.get(&column.property).cloned())
                                .unwrap_or(Value::Null),
                        );
                    }
                }
                rows.push(row);
            }
        }
        rows
    }

    #[test]
    fn test_assembled_graph_matches_evaluator() {
        let db = seeded_database();
        let registry = shared_registry();
        let query = SelectQuery::new("Post")
            .fetch("Author")
            .fetch_many("Comments")
            .then_fetch("Author");
        let plan = sql_server().translate_select(&query).unwrap().fetch_plan;

        let expected = db.query(&query).unwrap();
        let rows = flatten(&registry, &db, &plan, &expected);
        // one row per comment, plus one for the post without comments
        assert_eq!(rows.len(), 4);

        let assembled = plan.assemble(&rows).unwrap();
        assert_eq!(assembled, expected);

        let rust_tips = &assembled[0];
        let commenters: Vec<&str> = rust_tips
            .collection("Comments")
            .unwrap()
            .iter()
            .map(|c| c.reference("Author").unwrap().get("Username").unwrap().as_text().unwrap())
            .collect();
        assert_eq!(commenters, vec!["Mark", "James"]);
        assert!(assembled[2].reference("Author").is_none());
        assert_eq!(assembled[2].collection("Comments").unwrap().len(), 0);
    }

    /// Windowed pages put the row number in front of every row
    #[test]
    fn test_leading_columns_are_skipped() {
        let db = seeded_database();
        let registry = shared_registry();
        let query = SelectQuery::new("User").order_by("Username").skip(1).take(2);
        let plan = sql_server().translate_select(&query).unwrap().fetch_plan;
        assert_eq!(plan.leading_columns, 1);

        let page = db.query(&query).unwrap();
        let rows: Vec<Vec<Value>> = flatten(&registry, &db, &plan, &page)
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let mut numbered = vec![Value::Int(i as i64 + 2)];
                numbered.extend(row);
                numbered
            })
            .collect();

        let assembled = plan.assemble(&rows).unwrap();
        assert_eq!(texts(&assembled, "Username"), vec!["James", "Mark"]);
        assert_eq!(assembled, page);
    }

    #[test]
    fn test_row_width_is_checked() {
        let plan = sql_server()
            .translate_select(&SelectQuery::new("User"))
            .unwrap()
            .fetch_plan;
        let err = plan.assemble(&[vec![Value::Int(1)]]).unwrap_err();
        assert_eq!(
            err,
            TranslationError::MalformedRow {
                expected: 4,
                actual: 1
            }
        );
    }
}
