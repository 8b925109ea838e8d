use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use super::column::{Column, DbType, PropertyType, RelationshipKind};
use super::config::{EntityDefinition, PropertyDefinition};
use super::convention::Convention;
use super::errors::MappingError;
use super::schema::Index;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_ ]*$").expect("valid regex");
}

pub(crate) fn check_identifier(identifier: &str, context: impl FnOnce() -> String) -> Result<(), MappingError> {
    if IDENTIFIER.is_match(identifier) && !identifier.ends_with(' ') {
        Ok(())
    } else {
        Err(MappingError::InvalidIdentifier {
            identifier: identifier.to_string(),
            context: context(),
        })
    }
}

/// Mapping metadata for one entity type. Immutable once the registry is built.
#[derive(Debug, Clone)]
pub struct EntityMap {
    pub name: String,
    pub table: String,
    pub schema: Option<String>,
    columns: Vec<Column>,
    by_name: HashMap<String, usize>,
    primary_key: usize,
    pub indexes: Vec<Index>,
}

impl EntityMap {
    /// All columns in declaration order, ignored ones included.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Result<&Column, MappingError> {
        self.try_column(name)
            .ok_or_else(|| MappingError::unknown_property(&self.name, name))
    }

    pub fn try_column(&self, name: &str) -> Option<&Column> {
        self.by_name.get(name).map(|&i| &self.columns[i])
    }

    pub fn primary_key(&self) -> &Column {
        &self.columns[self.primary_key]
    }

    pub fn is_primary_key_auto_generated(&self) -> bool {
        self.primary_key().is_auto_generated
    }

    /// Columns stored in this entity's table.
    pub fn owned_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_owned())
    }

    /// Columns written by an INSERT: owned columns minus database-generated ones.
    pub fn insertable_columns(&self) -> impl Iterator<Item = &Column> {
        self.owned_columns().filter(|c| !c.is_auto_generated)
    }

    /// Columns written by an UPDATE: owned columns minus the key and generated ones.
    pub fn updatable_columns(&self) -> impl Iterator<Item = &Column> {
        self.owned_columns()
            .filter(|c| !c.is_primary_key && !c.is_auto_generated)
    }

    /// Columns selected when no explicit projection is requested.
    pub fn default_select_columns(&self) -> impl Iterator<Item = &Column> {
        self.owned_columns().filter(|c| !c.is_excluded_by_default)
    }

    /// One-to-many collection columns.
    pub fn collections(&self) -> impl Iterator<Item = &Column> {
        self.columns
            .iter()
            .filter(|c| !c.is_ignored && c.relationship == RelationshipKind::OneToMany)
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    /// Builds the map's own columns. Cross-entity facts (reference key types,
    /// back-references) are filled in by the registry.
    pub(crate) fn from_definition(
        definition: &EntityDefinition,
        convention: &Convention,
    ) -> Result<Self, MappingError> {
        let entity = definition.name.as_str();
        check_identifier(entity, || "entity name".to_string())?;

        let table = definition
            .table
            .clone()
            .unwrap_or_else(|| convention.table_for(entity));
        check_identifier(&table, || format!("table of `{}`", entity))?;
        if let Some(schema) = &definition.schema {
            check_identifier(schema, || format!("schema of `{}`", entity))?;
        }

        let key_name = primary_key_name(definition, convention)?;

        let mut columns = Vec::with_capacity(definition.properties.len());
        let mut by_name = HashMap::new();
        let mut db_names: HashMap<String, String> = HashMap::new();

        for (fetch_id, property) in definition.properties.iter().enumerate() {
            let is_key = property.name == key_name;
            let mut column = build_column(entity, property, is_key, convention)?;
            column.fetch_id = fetch_id;

            if by_name.insert(column.name.clone(), columns.len()).is_some() {
                return Err(MappingError::DuplicateColumn {
                    entity: entity.to_string(),
                    name: column.name.clone(),
                });
            }
            if column.is_owned() {
                if let Some(previous) = db_names.insert(column.db_name.to_lowercase(), column.name.clone()) {
                    log::warn!(
                        "Entity {} maps {} and {} to the same column",
                        entity,
                        previous,
                        column.name
                    );
                    return Err(MappingError::DuplicateColumn {
                        entity: entity.to_string(),
                        name: column.db_name.clone(),
                    });
                }
            }
            columns.push(column);
        }

        let primary_key = *by_name
            .get(&key_name)
            .ok_or_else(|| MappingError::MissingPrimaryKey {
                entity: entity.to_string(),
                column: key_name.clone(),
            })?;

        let key = &mut columns[primary_key];
        let key_type = match key.property_type {
            PropertyType::Scalar(db_type) => db_type,
            _ => {
                return Err(MappingError::conflicting(
                    entity,
                    &key.name,
                    "a primary key must be a scalar property",
                ))
            }
        };
        let generated = definition
            .auto_generated_key
            .unwrap_or(convention.auto_generated_keys && key_type.is_integral())
            || key.is_auto_generated;
        if generated && !key_type.is_integral() {
            return Err(MappingError::conflicting(
                entity,
                &key.name,
                format!("a {:?} key cannot be database generated", key_type),
            ));
        }
        key.is_auto_generated = generated;

        let mut map = EntityMap {
            name: entity.to_string(),
            table,
            schema: definition.schema.clone(),
            columns,
            by_name,
            primary_key,
            indexes: Vec::new(),
        };

        for (i, index) in definition.indexes.iter().enumerate() {
            let mut index_columns = Vec::with_capacity(index.columns.len());
            for name in &index.columns {
                let column = map.column(name)?;
                if !column.is_owned() {
                    return Err(MappingError::conflicting(
                        entity,
                        name,
                        "only stored columns can be indexed",
                    ));
                }
                index_columns.push(column.name.clone());
            }
            let name = index
                .name
                .clone()
                .unwrap_or_else(|| format!("idx_{}_{}", map.name, index.columns.join("_")));
            log::trace!("Index {} #{} on {}", name, i, map.name);
            map.indexes.push(Index {
                name,
                entity: map.name.clone(),
                columns: index_columns,
                is_unique: index.unique,
            });
        }

        Ok(map)
    }
}

fn primary_key_name(
    definition: &EntityDefinition,
    convention: &Convention,
) -> Result<String, MappingError> {
    let mut flagged: Vec<&str> = definition
        .properties
        .iter()
        .filter(|p| p.primary_key)
        .map(|p| p.name.as_str())
        .collect();
    if let Some(explicit) = &definition.primary_key {
        if !flagged.contains(&explicit.as_str()) {
            flagged.push(explicit);
        }
    }
    match flagged.as_slice() {
        [] => Ok(convention.primary_key_of(&definition.name)),
        [single] => Ok(single.to_string()),
        many => Err(MappingError::MultiplePrimaryKeys {
            entity: definition.name.clone(),
            columns: many.join(", "),
        }),
    }
}

fn build_column(
    entity: &str,
    property: &PropertyDefinition,
    is_key: bool,
    convention: &Convention,
) -> Result<Column, MappingError> {
    let name = property.name.as_str();
    check_identifier(name, || format!("property of `{}`", entity))?;

    let kinds = [
        property.db_type.is_some(),
        property.references.is_some(),
        property.one_to_one.is_some(),
        property.collection_of.is_some(),
    ];
    if kinds.iter().filter(|k| **k).count() != 1 {
        return Err(MappingError::invalid_definition(
            entity,
            name,
            "exactly one of `type`, `references`, `one_to_one` and `collection_of` must be set",
        ));
    }

    // Reference key types are patched in once every map exists.
    let (property_type, relationship, db_type) = if let Some(db_type) = property.db_type {
        (PropertyType::Scalar(db_type), RelationshipKind::None, db_type)
    } else if let Some(target) = &property.references {
        (PropertyType::Entity(target.clone()), RelationshipKind::ManyToOne, DbType::Int32)
    } else if let Some(target) = &property.one_to_one {
        (PropertyType::Entity(target.clone()), RelationshipKind::OneToOne, DbType::Int32)
    } else if let Some(target) = &property.collection_of {
        (PropertyType::Collection(target.clone()), RelationshipKind::OneToMany, DbType::Object)
    } else {
        return Err(MappingError::invalid_definition(entity, name, "the property kind is missing"));
    };

    let db_name = match (&property.column, relationship) {
        (Some(column), _) => column.clone(),
        (None, RelationshipKind::ManyToOne | RelationshipKind::OneToOne) => {
            convention.reference_column_for(name)
        }
        (None, _) => name.to_string(),
    };
    check_identifier(&db_name, || format!("column of `{}.{}`", entity, name))?;

    let mut column = Column::new(entity, name, db_name, property_type, relationship, db_type);

    if is_key || property.primary_key {
        if relationship != RelationshipKind::None {
            return Err(MappingError::conflicting(
                entity,
                name,
                "a relationship cannot be the primary key",
            ));
        }
        if property.ignored {
            return Err(MappingError::conflicting(
                entity,
                name,
                "the primary key cannot be ignored",
            ));
        }
        if property.excluded_by_default {
            return Err(MappingError::conflicting(
                entity,
                name,
                "the primary key cannot be excluded from queries",
            ));
        }
        if property.nullable == Some(true) {
            return Err(MappingError::conflicting(
                entity,
                name,
                "the primary key cannot be nullable",
            ));
        }
        column.is_primary_key = true;
        column.is_auto_generated = property.auto_generated;
    } else if property.auto_generated {
        return Err(MappingError::conflicting(
            entity,
            name,
            "only the primary key can be database generated",
        ));
    }

    if relationship == RelationshipKind::OneToMany {
        if property.column.is_some() || property.nullable.is_some() {
            return Err(MappingError::conflicting(
                entity,
                name,
                "a collection has no column of its own",
            ));
        }
        column.child_column_name = property.maps_to.clone();
    } else if property.maps_to.is_some() {
        return Err(MappingError::conflicting(
            entity,
            name,
            "`maps_to` only applies to collections",
        ));
    }

    if property.opposite.is_some() && relationship != RelationshipKind::OneToOne {
        return Err(MappingError::conflicting(
            entity,
            name,
            "`opposite` only applies to one-to-one references",
        ));
    }
    column.opposite_column_name = property.opposite.clone();

    column.is_nullable = !column.is_primary_key
        && property.nullable.unwrap_or(match relationship {
            RelationshipKind::None => db_type.nullable_by_default(),
            _ => true,
        });

    if db_type.takes_length() {
        column.max_length = property.max_length;
        column.length = Some(property.length.unwrap_or(convention.string_length));
    }
    if matches!(db_type, DbType::Decimal) && relationship == RelationshipKind::None {
        let precision = property.precision.unwrap_or(convention.decimal_precision);
        let scale = property.scale.unwrap_or(convention.decimal_scale);
        if scale > precision {
            return Err(MappingError::conflicting(
                entity,
                name,
                format!("scale {} exceeds precision {}", scale, precision),
            ));
        }
        column.precision = Some(precision);
        column.scale = Some(scale);
    }

    column.default = property.default.clone();
    column.is_ignored = property.ignored;
    column.is_excluded_by_default = property.excluded_by_default;

    Ok(column)
}
