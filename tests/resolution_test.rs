use relmap::errors::RelmapError;
use relmap::resolution::{find_primary_key, resolve, RelationshipResolver};
use relmap::types::*;

fn field(collection: &str, name: &str, primary_key: bool) -> FieldMeta {
    FieldMeta {
        collection: collection.to_string(),
        field: name.to_string(),
        schema: Some(FieldSchema {
            is_primary_key: primary_key,
        }),
    }
}

fn alias(collection: &str, name: &str) -> FieldMeta {
    FieldMeta {
        collection: collection.to_string(),
        field: name.to_string(),
        schema: None,
    }
}

fn reference(collection: &str, primary_key: &str) -> RelationshipReference {
    RelationshipReference {
        collection: collection.to_string(),
        primary_key: primary_key.to_string(),
    }
}

/// `articles.author` points at `users`; `users.articles` is its reverse side.
fn author_relation() -> RelationMeta {
    RelationMeta {
        collection: "articles".to_string(),
        field: "author".to_string(),
        related_collection: Some("users".to_string()),
        meta: Some(RelationDetails {
            one_field: Some("articles".to_string()),
            one_collection: Some("users".to_string()),
            many_collection: Some("articles".to_string()),
            ..Default::default()
        }),
    }
}

/// `blocks.item` may point at `headings`, `images` or `quotes`.
fn item_relation(allowed: AllowedCollections) -> RelationMeta {
    RelationMeta {
        collection: "blocks".to_string(),
        field: "item".to_string(),
        related_collection: None,
        meta: Some(RelationDetails {
            one_collection_field: Some("collection".to_string()),
            one_allowed_collections: Some(allowed),
            ..Default::default()
        }),
    }
}

fn setup_fields() -> Vec<FieldMeta> {
    vec![
        field("articles", "id", true),
        field("articles", "title", false),
        field("articles", "author", false),
        field("users", "uuid", true),
        field("users", "name", false),
        alias("users", "articles"),
        field("blocks", "id", true),
        field("blocks", "item", false),
        field("blocks", "collection", false),
        field("headings", "id", true),
        field("images", "file_id", true),
        field("quotes", "key", true),
    ]
}

#[test]
fn test_no_matching_relation_is_absent() {
    let fields = setup_fields();
    let relations = vec![author_relation()];

    let result = resolve(&fields, &relations, "articles", "title").unwrap();
    assert_eq!(result, Relationship::Absent);
    assert!(!result.is_relationship());
}

#[test]
fn test_empty_relations_is_absent() {
    let fields = setup_fields();
    let result = resolve(&fields, &[], "articles", "author").unwrap();
    assert_eq!(result, Relationship::Absent);
}

#[test]
fn test_resolve_many_to_one() {
    let fields = setup_fields();
    let relations = vec![author_relation()];

    let result = resolve(&fields, &relations, "articles", "author").unwrap();
    assert_eq!(
        result,
        Relationship::ManyToOne {
            collection: "articles".to_string(),
            field: "author".to_string(),
            reference: reference("users", "uuid"),
        }
    );
    assert_eq!(result.many(), Some(false));
}

#[test]
fn test_resolve_one_to_many_from_reverse_side() {
    let fields = setup_fields();
    let relations = vec![author_relation()];

    let result = resolve(&fields, &relations, "users", "articles").unwrap();
    assert_eq!(
        result,
        Relationship::OneToMany {
            collection: "users".to_string(),
            field: "articles".to_string(),
            reference: reference("articles", "id"),
        }
    );
    assert_eq!(result.many(), Some(true));
}

#[test]
fn test_reverse_side_requires_one_field() {
    let fields = setup_fields();
    let mut relation = author_relation();
    relation.meta.as_mut().unwrap().one_field = None;
    let relations = vec![relation];

    let result = resolve(&fields, &relations, "users", "articles").unwrap();
    assert_eq!(result, Relationship::Absent);
}

#[test]
fn test_resolve_any_to_one_from_joined_string() {
    let fields = setup_fields();
    let relations = vec![item_relation(AllowedCollections::Joined(
        "headings, images,quotes".to_string(),
    ))];

    let result = resolve(&fields, &relations, "blocks", "item").unwrap();
    assert_eq!(
        result,
        Relationship::AnyToOne {
            collection: "blocks".to_string(),
            field: "item".to_string(),
            refs: vec![
                reference("headings", "id"),
                reference("images", "file_id"),
                reference("quotes", "key"),
            ],
        }
    );
}

#[test]
fn test_resolve_any_to_one_from_list_keeps_order_and_duplicates() {
    let fields = setup_fields();
    let relations = vec![item_relation(AllowedCollections::List(vec![
        " quotes".to_string(),
        "headings".to_string(),
        "quotes ".to_string(),
    ]))];

    let result = resolve(&fields, &relations, "blocks", "item").unwrap();
    let collections: Vec<&str> = result
        .references()
        .iter()
        .map(|r| r.collection.as_str())
        .collect();
    assert_eq!(collections, vec!["quotes", "headings", "quotes"]);
}

#[test]
fn test_any_to_one_wins_over_many_to_one() {
    let fields = setup_fields();
    let mut relation = item_relation(AllowedCollections::Joined("images".to_string()));
    relation.meta.as_mut().unwrap().one_collection = Some("headings".to_string());
    let relations = vec![relation];

    let result = resolve(&fields, &relations, "blocks", "item").unwrap();
    assert!(result.is_any_to_one(), "expected any-to-one, got {:?}", result);
    assert_eq!(result.references(), &[reference("images", "file_id")]);
}

#[test]
fn test_any_to_one_without_discriminator_falls_back_to_many_to_one() {
    let fields = setup_fields();
    let mut relation = item_relation(AllowedCollections::Joined("images".to_string()));
    let meta = relation.meta.as_mut().unwrap();
    meta.one_collection_field = None;
    meta.one_collection = Some("headings".to_string());
    let relations = vec![relation];

    let result = resolve(&fields, &relations, "blocks", "item").unwrap();
    assert!(result.is_many_to_one());
    assert_eq!(result.references(), &[reference("headings", "id")]);
}

#[test]
fn test_empty_allowed_list_resolves_any_to_one_without_refs() {
    let fields = setup_fields();
    let relations = vec![item_relation(AllowedCollections::List(Vec::new()))];

    let result = resolve(&fields, &relations, "blocks", "item").unwrap();
    assert_eq!(
        result,
        Relationship::AnyToOne {
            collection: "blocks".to_string(),
            field: "item".to_string(),
            refs: Vec::new(),
        }
    );
}

#[test]
fn test_empty_discriminator_is_not_any_to_one() {
    let fields = setup_fields();
    let mut relation = item_relation(AllowedCollections::Joined("images".to_string()));
    relation.meta.as_mut().unwrap().one_collection_field = Some(String::new());
    let relations = vec![relation];

    let result = resolve(&fields, &relations, "blocks", "item").unwrap();
    assert_eq!(result, Relationship::Absent);
}

#[test]
fn test_empty_joined_allowed_collections_is_not_any_to_one() {
    let fields = setup_fields();
    let mut relation = item_relation(AllowedCollections::Joined(String::new()));
    relation.meta.as_mut().unwrap().one_collection = Some("headings".to_string());
    let relations = vec![relation];

    let result = resolve(&fields, &relations, "blocks", "item").unwrap();
    assert!(result.is_many_to_one(), "expected many-to-one, got {:?}", result);
}

#[test]
fn test_malformed_relation_is_absent() {
    let fields = setup_fields();
    let relations = vec![RelationMeta {
        collection: "articles".to_string(),
        field: "author".to_string(),
        related_collection: Some("users".to_string()),
        meta: None,
    }];

    let result = resolve(&fields, &relations, "articles", "author").unwrap();
    assert_eq!(result, Relationship::Absent);
}

#[test]
fn test_first_matching_relation_wins() {
    let fields = setup_fields();
    let mut duplicate = author_relation();
    duplicate.meta.as_mut().unwrap().one_collection = Some("blocks".to_string());
    let relations = vec![author_relation(), duplicate];

    let result = resolve(&fields, &relations, "articles", "author").unwrap();
    assert_eq!(result.references(), &[reference("users", "uuid")]);
}

#[test]
fn test_missing_primary_key_names_collection() {
    let fields = vec![field("articles", "id", true), field("users", "name", false)];
    let relations = vec![author_relation()];

    let err = resolve(&fields, &relations, "articles", "author").unwrap_err();
    match &err {
        RelmapError::MissingPrimaryKey { collection } => assert_eq!(collection, "users"),
        other => panic!("expected MissingPrimaryKey, got {:?}", other),
    }
    assert_eq!(err.to_string(), "cannot find primary key for users");
}

#[test]
fn test_missing_primary_key_in_any_to_one_target_fails() {
    let fields = setup_fields();
    let relations = vec![item_relation(AllowedCollections::Joined(
        "headings,videos".to_string(),
    ))];

    let err = resolve(&fields, &relations, "blocks", "item").unwrap_err();
    assert!(matches!(
        err,
        RelmapError::MissingPrimaryKey { ref collection } if collection == "videos"
    ));
}

#[test]
fn test_resolve_is_idempotent() {
    let fields = setup_fields();
    let relations = vec![
        author_relation(),
        item_relation(AllowedCollections::Joined("headings,images".to_string())),
    ];

    for (collection, name) in [("articles", "author"), ("users", "articles"), ("blocks", "item")] {
        let first = resolve(&fields, &relations, collection, name).unwrap();
        let second = resolve(&fields, &relations, collection, name).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_find_primary_key() {
    let fields = setup_fields();
    assert_eq!(find_primary_key(&fields, "users").unwrap(), "uuid");
    assert!(find_primary_key(&fields, "missing").is_err());
}

#[test]
fn test_find_primary_key_ignores_alias_fields() {
    let fields = vec![alias("pages", "id"), field("pages", "slug", true)];
    assert_eq!(find_primary_key(&fields, "pages").unwrap(), "slug");
}

#[test]
fn test_resolver_resolve_collection() {
    let fields = setup_fields();
    let relations = vec![author_relation()];
    let resolver = RelationshipResolver::new(&fields, &relations);

    let users = resolver.resolve_collection("users").unwrap();
    assert_eq!(users.len(), 1);
    assert!(users[0].is_one_to_many());

    let quotes = resolver.resolve_collection("quotes").unwrap();
    assert!(quotes.is_empty());
}

#[test]
fn test_resolver_resolve_all() {
    let fields = setup_fields();
    let relations = vec![author_relation()];
    let resolver = RelationshipResolver::new(&fields, &relations);

    let queries = vec![
        RelationshipQuery::new("articles", "author"),
        RelationshipQuery::new("articles", "title"),
        RelationshipQuery::new("users", "articles"),
    ];

    let summary = resolver.resolve_all(&queries).unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.resolved_count, 2);
    assert_eq!(summary.unresolved, vec![RelationshipQuery::new("articles", "title")]);
}
