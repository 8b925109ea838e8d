use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use super::column::{Column, PropertyType, RelationshipKind};
use super::config::MappingConfig;
use super::convention::Convention;
use super::entity_map::EntityMap;
use super::errors::MappingError;
use super::schema::ForeignKey;

/// The configuration registry: every entity map, keyed by entity name.
///
/// Built once, then shared read-only by all translations.
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    maps: BTreeMap<String, EntityMap>,
}

impl MappingRegistry {
    /// Builds and validates every map in `config`.
    ///
    /// Relationship resolution runs here so that missing or ambiguous back-references
    /// fail the build rather than the first query that touches them.
    pub fn build(config: &MappingConfig, convention: &Convention) -> Result<Self, MappingError> {
        let mut maps = BTreeMap::new();
        for definition in &config.entities {
            let map = EntityMap::from_definition(definition, convention)?;
            if maps.insert(map.name.clone(), map).is_some() {
                return Err(MappingError::DuplicateEntity {
                    entity: definition.name.clone(),
                });
            }
        }

        resolve_reference_types(&mut maps)?;

        let registry = MappingRegistry { maps };
        registry.validate_relationships()?;

        log::debug!(
            "Built mapping registry with {} entities: {}",
            registry.maps.len(),
            registry.maps.keys().cloned().collect::<Vec<_>>().join(", ")
        );
        Ok(registry)
    }

    /// `describeEntity`: the map of an entity type.
    pub fn resolve(&self, entity: &str) -> Result<&EntityMap, MappingError> {
        self.maps
            .get(entity)
            .ok_or_else(|| MappingError::UnknownEntity {
                entity: entity.to_string(),
            })
    }

    /// Resolves a dotted property path (`Post.Author.Username`) starting at `entity`.
    ///
    /// Every segment but the last must be a many-to-one or one-to-one reference.
    pub fn resolve_path(&self, entity: &str, path: &str) -> Result<&Column, MappingError> {
        let segments: Vec<&str> = path.split('.').collect();
        let mut map = self.resolve(entity)?;
        for (i, segment) in segments.iter().enumerate() {
            let column = map.column(segment)?;
            if column.is_ignored {
                return Err(MappingError::unknown_property(&map.name, *segment));
            }
            if i + 1 == segments.len() {
                return Ok(column);
            }
            map = column.parent_map(self)?;
        }
        Err(MappingError::unknown_property(entity, path))
    }

    pub fn maps(&self) -> impl Iterator<Item = &EntityMap> {
        self.maps.values()
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.maps.contains_key(entity)
    }

    /// Foreign keys for every stored reference, in entity then declaration order.
    pub fn foreign_keys(&self) -> Vec<ForeignKey> {
        self.maps
            .values()
            .flat_map(|map| {
                map.owned_columns()
                    .filter(|c| c.is_reference())
                    .filter_map(|c| {
                        c.related_entity()
                            .map(|parent| ForeignKey::new(&map.name, &c.name, parent))
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// SHA-256 digest over the shape of every map. Identical configurations produce
    /// identical fingerprints across process runs.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for map in self.maps.values() {
            hasher.update(format!(
                "{}|{}|{}\n",
                map.name,
                map.schema.as_deref().unwrap_or(""),
                map.table
            ));
            for column in map.columns() {
                hasher.update(format!(
                    "{}:{}:{}:{:?}:{:?}:{}:{}:{}\n",
                    column.fetch_id,
                    column.name,
                    column.db_name,
                    column.property_type,
                    column.db_type,
                    column.is_nullable,
                    column.is_primary_key,
                    column.is_ignored
                ));
            }
        }
        hex::encode(hasher.finalize())
    }

    fn validate_relationships(&self) -> Result<(), MappingError> {
        for map in self.maps.values() {
            for column in map.columns().iter().filter(|c| !c.is_ignored) {
                match column.relationship {
                    RelationshipKind::OneToMany => {
                        column.child_column(self)?;
                    }
                    RelationshipKind::OneToOne => {
                        if let Some(opposite) = column.opposite_column(self)? {
                            let points_back = opposite.relationship == RelationshipKind::OneToOne
                                && opposite.related_entity() == Some(map.name.as_str());
                            if !points_back {
                                return Err(MappingError::OppositeColumnMismatch {
                                    entity: map.name.clone(),
                                    property: column.name.clone(),
                                    opposite: opposite.name.clone(),
                                });
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

/// Gives every reference column the database type (and size) of the key it points at.
fn resolve_reference_types(maps: &mut BTreeMap<String, EntityMap>) -> Result<(), MappingError> {
    let keys: BTreeMap<String, Column> = maps
        .iter()
        .map(|(name, map)| (name.clone(), map.primary_key().clone()))
        .collect();

    for map in maps.values_mut() {
        for column in map.columns_mut() {
            let (PropertyType::Entity(target) | PropertyType::Collection(target)) =
                &column.property_type
            else {
                continue;
            };
            let Some(key) = keys.get(target) else {
                return Err(MappingError::UnknownEntity {
                    entity: target.clone(),
                });
            };
            if column.is_reference() {
                column.db_type = key.db_type;
                column.length = key.length;
                column.max_length = key.max_length;
                column.precision = key.precision;
                column.scale = key.scale;
            }
        }
    }
    Ok(())
}
