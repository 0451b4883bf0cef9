use tracing::debug;

use crate::errors::{RelmapError, Result};
use crate::types::*;

/// Resolves the relationship a `(collection, field)` pair participates in.
///
/// Scans `relations` for the first record either owned by the pair
/// (`collection`/`field` match) or reversed onto it (`related_collection` and
/// `meta.one_field` match). Later records that also match are ignored, so
/// duplicate relation records resolve to whichever comes first.
///
/// The matched record is classified in priority order:
/// 1. **Any-to-one** -- owning side with both `one_collection_field` and
///    `one_allowed_collections` set.
/// 2. **Many-to-one** -- owning side with `one_collection` set.
/// 3. **One-to-many** -- reverse side with `many_collection` set.
///
/// Returns [`Relationship::Absent`] when nothing matches or the matched record
/// fits none of the shapes.
///
/// # Errors
///
/// Returns [`RelmapError::MissingPrimaryKey`] if any target collection has no
/// field flagged as primary key.
pub fn resolve(
    fields: &[FieldMeta],
    relations: &[RelationMeta],
    collection: &str,
    field: &str,
) -> Result<Relationship> {
    let Some(relation) = relations
        .iter()
        .find(|r| r.is_owned_by(collection, field) || r.is_reverse_of(collection, field))
    else {
        debug!(collection, field, "no relation record matches");
        return Ok(Relationship::Absent);
    };

    let owned = relation.is_owned_by(collection, field);
    let details = relation.details();

    if owned && is_set(details.one_collection_field.as_deref()) {
        if let Some(allowed) = details.one_allowed_collections.as_ref().filter(|a| a.is_set()) {
            let refs = allowed
                .names()
                .into_iter()
                .map(|name| reference_to(fields, name))
                .collect::<Result<Vec<_>>>()?;
            debug!(collection, field, targets = refs.len(), "resolved any-to-one");
            return Ok(Relationship::AnyToOne {
                collection: collection.to_string(),
                field: field.to_string(),
                refs,
            });
        }
    }

    if owned {
        if let Some(one_collection) = details.one_collection.as_deref() {
            debug!(collection, field, target_collection = one_collection, "resolved many-to-one");
            return Ok(Relationship::ManyToOne {
                collection: collection.to_string(),
                field: field.to_string(),
                reference: reference_to(fields, one_collection.to_string())?,
            });
        }
    }

    if relation.is_reverse_of(collection, field) {
        if let Some(many_collection) = details.many_collection.as_deref() {
            debug!(collection, field, target_collection = many_collection, "resolved one-to-many");
            return Ok(Relationship::OneToMany {
                collection: collection.to_string(),
                field: field.to_string(),
                reference: reference_to(fields, many_collection.to_string())?,
            });
        }
    }

    debug!(
        collection,
        field,
        relation.collection = %relation.collection,
        relation.field = %relation.field,
        "matched relation record fits no relationship shape"
    );
    Ok(Relationship::Absent)
}

/// Returns the name of the primary key field of `collection`.
///
/// The first field of the collection flagged `is_primary_key` wins.
///
/// # Errors
///
/// Returns [`RelmapError::MissingPrimaryKey`] if no field of the collection is
/// flagged as primary key.
pub fn find_primary_key(fields: &[FieldMeta], collection: &str) -> Result<String> {
    fields
        .iter()
        .find(|f| f.collection == collection && f.is_primary_key())
        .map(|f| f.field.clone())
        .ok_or_else(|| RelmapError::MissingPrimaryKey {
            collection: collection.to_string(),
        })
}

/// Resolves relationships against borrowed field and relation lists.
///
/// Holds no state beyond the two borrows; every call rescans the lists.
#[derive(Debug, Clone, Copy)]
pub struct RelationshipResolver<'a> {
    fields: &'a [FieldMeta],
    relations: &'a [RelationMeta],
}

impl<'a> RelationshipResolver<'a> {
    pub fn new(fields: &'a [FieldMeta], relations: &'a [RelationMeta]) -> Self {
        Self { fields, relations }
    }

    /// Resolves a single `(collection, field)` pair. See [`resolve`].
    pub fn resolve(&self, collection: &str, field: &str) -> Result<Relationship> {
        resolve(self.fields, self.relations, collection, field)
    }

    /// Returns the primary key field of `collection`. See [`find_primary_key`].
    pub fn primary_key(&self, collection: &str) -> Result<String> {
        find_primary_key(self.fields, collection)
    }

    /// Resolves every field declared for `collection`, in field-list order,
    /// keeping only the fields that participate in a relationship.
    pub fn resolve_collection(&self, collection: &str) -> Result<Vec<Relationship>> {
        let mut relationships = Vec::new();
        for meta in self.fields.iter().filter(|f| f.collection == collection) {
            let relationship = self.resolve(collection, &meta.field)?;
            if relationship.is_relationship() {
                relationships.push(relationship);
            }
        }
        Ok(relationships)
    }

    /// Resolves a batch of queries, returning a summary of the results.
    ///
    /// Queries without a relationship are reported as unresolved; a missing
    /// primary key aborts the whole batch.
    pub fn resolve_all(&self, queries: &[RelationshipQuery]) -> Result<ResolutionSummary> {
        let total = queries.len();
        let mut resolved = Vec::new();
        let mut unresolved = Vec::new();

        for query in queries {
            match self.resolve(&query.collection, &query.field)? {
                Relationship::Absent => unresolved.push(query.clone()),
                relationship => resolved.push(relationship),
            }
        }

        let resolved_count = resolved.len();

        Ok(ResolutionSummary {
            resolved,
            unresolved,
            total,
            resolved_count,
        })
    }
}

// ------------------------------------------------------------------
// Private helpers
// ------------------------------------------------------------------

fn reference_to(fields: &[FieldMeta], collection: String) -> Result<RelationshipReference> {
    let primary_key = find_primary_key(fields, &collection)?;
    Ok(RelationshipReference {
        collection,
        primary_key,
    })
}

/// Empty strings count as unset, matching how schema stores blank out
/// optional meta entries.
fn is_set(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}
