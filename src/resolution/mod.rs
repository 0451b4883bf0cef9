/// Relationship resolution module.
///
/// Classifies the relation record matching a `(collection, field)` pair as a
/// many-to-one, one-to-many or any-to-one relationship and resolves the
/// primary key of every collection it points to.
mod resolver;

pub use resolver::{find_primary_key, resolve, RelationshipResolver};
