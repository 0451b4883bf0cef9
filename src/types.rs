use serde::{Deserialize, Deserializer, Serialize};

/// Shapes a resolved relationship can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    ManyToOne,
    OneToMany,
    AnyToOne,
}

#[allow(clippy::should_implement_trait)]
impl RelationshipKind {
    /// Returns the short tag used in serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::ManyToOne => "m2o",
            RelationshipKind::OneToMany => "o2m",
            RelationshipKind::AnyToOne => "a2o",
        }
    }

    /// Parses a short tag into a `RelationshipKind`, returning `None` for unrecognized values.
    pub fn from_str(s: &str) -> Option<RelationshipKind> {
        match s {
            "m2o" => Some(RelationshipKind::ManyToOne),
            "o2m" => Some(RelationshipKind::OneToMany),
            "a2o" => Some(RelationshipKind::AnyToOne),
            _ => None,
        }
    }
}

/// Column-level schema details of a field. Alias fields have none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_primary_key: bool,
}

/// One declared field of one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub collection: String,
    pub field: String,
    #[serde(default)]
    pub schema: Option<FieldSchema>,
}

impl FieldMeta {
    /// Returns true when the field's schema flags it as the primary key.
    pub fn is_primary_key(&self) -> bool {
        self.schema.as_ref().is_some_and(|s| s.is_primary_key)
    }
}

/// The set of collections a polymorphic relation may point to.
///
/// Schema stores emit this either as one comma-joined string or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AllowedCollections {
    Joined(String),
    List(Vec<String>),
}

impl AllowedCollections {
    /// Returns the collection names in declared order, each trimmed of
    /// surrounding whitespace. Duplicates and empty entries are kept.
    pub fn names(&self) -> Vec<String> {
        match self {
            AllowedCollections::Joined(joined) => {
                joined.split(',').map(|s| s.trim().to_string()).collect()
            }
            AllowedCollections::List(list) => list.iter().map(|s| s.trim().to_string()).collect(),
        }
    }

    /// An empty joined string counts as unset.
    pub fn is_set(&self) -> bool {
        match self {
            AllowedCollections::Joined(joined) => !joined.is_empty(),
            AllowedCollections::List(_) => true,
        }
    }
}

/// The `meta` block of a relation record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationDetails {
    #[serde(default)]
    pub one_field: Option<String>,
    #[serde(default)]
    pub one_collection: Option<String>,
    #[serde(default)]
    pub many_collection: Option<String>,
    #[serde(default)]
    pub one_collection_field: Option<String>,
    #[serde(default)]
    pub one_allowed_collections: Option<AllowedCollections>,
}

static EMPTY_DETAILS: RelationDetails = RelationDetails {
    one_field: None,
    one_collection: None,
    many_collection: None,
    one_collection_field: None,
    one_allowed_collections: None,
};

/// One declared relation between two collections.
///
/// `collection`/`field` name the owning side holding the foreign key (or the
/// polymorphic key); `related_collection` names the one side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationMeta {
    pub collection: String,
    pub field: String,
    #[serde(default)]
    pub related_collection: Option<String>,
    #[serde(default)]
    pub meta: Option<RelationDetails>,
}

impl RelationMeta {
    /// Returns the `meta` block, or an all-empty block when the record has none.
    pub fn details(&self) -> &RelationDetails {
        self.meta.as_ref().unwrap_or(&EMPTY_DETAILS)
    }

    /// True when this record is queried from its owning side.
    pub fn is_owned_by(&self, collection: &str, field: &str) -> bool {
        self.collection == collection && self.field == field
    }

    /// True when this record is queried from its reverse (virtual) side.
    pub fn is_reverse_of(&self, collection: &str, field: &str) -> bool {
        self.related_collection.as_deref() == Some(collection)
            && self.details().one_field.as_deref() == Some(field)
    }
}

/// A resolved pointer to a collection and its primary key field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipReference {
    pub collection: String,
    #[serde(rename = "pk")]
    pub primary_key: String,
}

/// The relationship a `(collection, field)` pair participates in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Option<TaggedRelationship>", from = "Option<TaggedRelationship>")]
pub enum Relationship {
    /// The field holds a foreign key to exactly one other collection.
    ManyToOne {
        collection: String,
        field: String,
        reference: RelationshipReference,
    },
    /// The (virtual) field is the reverse side: rows of another collection
    /// point back here.
    OneToMany {
        collection: String,
        field: String,
        reference: RelationshipReference,
    },
    /// The field may point to any of several collections, disambiguated by a
    /// companion discriminator field.
    AnyToOne {
        collection: String,
        field: String,
        refs: Vec<RelationshipReference>,
    },
    /// No relation record describes the pair.
    Absent,
}

impl Relationship {
    pub fn is_relationship(&self) -> bool {
        !matches!(self, Relationship::Absent)
    }

    pub fn is_many_to_one(&self) -> bool {
        matches!(self, Relationship::ManyToOne { .. })
    }

    pub fn is_one_to_many(&self) -> bool {
        matches!(self, Relationship::OneToMany { .. })
    }

    pub fn is_any_to_one(&self) -> bool {
        matches!(self, Relationship::AnyToOne { .. })
    }

    pub fn kind(&self) -> Option<RelationshipKind> {
        match self {
            Relationship::ManyToOne { .. } => Some(RelationshipKind::ManyToOne),
            Relationship::OneToMany { .. } => Some(RelationshipKind::OneToMany),
            Relationship::AnyToOne { .. } => Some(RelationshipKind::AnyToOne),
            Relationship::Absent => None,
        }
    }

    /// The `many` flag of single-target relationships: `false` for
    /// many-to-one, `true` for one-to-many, `None` otherwise.
    pub fn many(&self) -> Option<bool> {
        match self {
            Relationship::ManyToOne { .. } => Some(false),
            Relationship::OneToMany { .. } => Some(true),
            _ => None,
        }
    }

    pub fn collection(&self) -> Option<&str> {
        match self {
            Relationship::ManyToOne { collection, .. }
            | Relationship::OneToMany { collection, .. }
            | Relationship::AnyToOne { collection, .. } => Some(collection),
            Relationship::Absent => None,
        }
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            Relationship::ManyToOne { field, .. }
            | Relationship::OneToMany { field, .. }
            | Relationship::AnyToOne { field, .. } => Some(field),
            Relationship::Absent => None,
        }
    }

    /// Every target of the relationship, in declared order.
    pub fn references(&self) -> &[RelationshipReference] {
        match self {
            Relationship::ManyToOne { reference, .. } | Relationship::OneToMany { reference, .. } => {
                std::slice::from_ref(reference)
            }
            Relationship::AnyToOne { refs, .. } => refs,
            Relationship::Absent => &[],
        }
    }
}

/// Wire form of [`Relationship`]: a `type`-tagged object, with `null` for
/// [`Relationship::Absent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TaggedRelationship {
    #[serde(rename = "m2o")]
    ManyToOne {
        collection: String,
        field: String,
        #[serde(default)]
        many: bool,
        #[serde(rename = "ref")]
        reference: RelationshipReference,
    },
    #[serde(rename = "o2m")]
    OneToMany {
        collection: String,
        field: String,
        #[serde(default)]
        many: bool,
        #[serde(rename = "ref")]
        reference: RelationshipReference,
    },
    #[serde(rename = "a2o")]
    AnyToOne {
        collection: String,
        field: String,
        refs: Vec<RelationshipReference>,
    },
}

impl From<Relationship> for Option<TaggedRelationship> {
    fn from(relationship: Relationship) -> Self {
        match relationship {
            Relationship::ManyToOne {
                collection,
                field,
                reference,
            } => Some(TaggedRelationship::ManyToOne {
                collection,
                field,
                many: false,
                reference,
            }),
            Relationship::OneToMany {
                collection,
                field,
                reference,
            } => Some(TaggedRelationship::OneToMany {
                collection,
                field,
                many: true,
                reference,
            }),
            Relationship::AnyToOne {
                collection,
                field,
                refs,
            } => Some(TaggedRelationship::AnyToOne {
                collection,
                field,
                refs,
            }),
            Relationship::Absent => None,
        }
    }
}

impl From<Option<TaggedRelationship>> for Relationship {
    fn from(tagged: Option<TaggedRelationship>) -> Self {
        match tagged {
            Some(TaggedRelationship::ManyToOne {
                collection,
                field,
                reference,
                ..
            }) => Relationship::ManyToOne {
                collection,
                field,
                reference,
            },
            Some(TaggedRelationship::OneToMany {
                collection,
                field,
                reference,
                ..
            }) => Relationship::OneToMany {
                collection,
                field,
                reference,
            },
            Some(TaggedRelationship::AnyToOne {
                collection,
                field,
                refs,
            }) => Relationship::AnyToOne {
                collection,
                field,
                refs,
            },
            None => Relationship::Absent,
        }
    }
}

/// A `(collection, field)` pair to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipQuery {
    pub collection: String,
    pub field: String,
}

impl RelationshipQuery {
    pub fn new(collection: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            field: field.into(),
        }
    }
}

/// Summary of a batch resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionSummary {
    pub resolved: Vec<Relationship>,
    pub unresolved: Vec<RelationshipQuery>,
    pub total: usize,
    pub resolved_count: usize,
}

fn null_as_false<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}
