//! Integration tests for declaration, transform and change tracking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use docmap_core::changes::INC;
use docmap_core::{
    Annotation, Configuration, DeclarationProvider, Error, FieldType, Identifier,
    IdentityGenerator, Mapper, MappingProvider, MappingRegistry, ObjectRef, Observer,
    PropertyAnnotation, PropertyDeclaration, ScalarType, TrackedEntity, TypeDeclaration, TypeKey,
    Value,
};
use proptest::prelude::*;
use serde_json::{json, Value as Json};

/// Accepts any non-empty string and generates increasing numbers.
#[derive(Debug, Default)]
struct Sequential(AtomicU64);

impl IdentityGenerator for Sequential {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn generate(&self) -> Identifier {
        Identifier::new((self.0.fetch_add(1, Ordering::Relaxed) + 1).to_string())
    }

    fn validate(&self, id: &Identifier) -> bool {
        id.as_str().is_some_and(|s| !s.is_empty())
    }

    fn are_equal(&self, a: &Identifier, b: &Identifier) -> bool {
        self.validate(a) && self.validate(b) && a.as_str() == b.as_str()
    }

    fn parse(&self, text: &str) -> Option<Identifier> {
        (!text.is_empty()).then(|| Identifier::new(text))
    }

    fn format(&self, id: &Identifier) -> String {
        id.as_str().unwrap_or_default().to_string()
    }
}

struct TestContext {
    registry: Arc<MappingRegistry>,
    person: TypeKey,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl TestContext {
    fn new() -> Self {
        init_tracing();
        let config = Configuration::new().with_identity_generator(Arc::new(Sequential::default()));
        let (person, address) = (TypeKey::allocate(), TypeKey::allocate());

        let provider = DeclarationProvider::new([
            TypeDeclaration::embeddable(address, "Address")
                .property(PropertyDeclaration::new("street", FieldType::scalar(ScalarType::String)))
                .property(PropertyDeclaration::new("city", FieldType::scalar(ScalarType::String))),
            person_declaration(person, address),
        ]);

        let registry = config.build_registry(&[&provider]).unwrap();
        Self {
            registry: Arc::new(registry),
            person,
        }
    }

    fn mapper(&self) -> Mapper<'_> {
        Mapper::new(&self.registry)
    }

    fn read(&self, document: &Json) -> ObjectRef {
        let mapping = self.registry.get_mapping(self.person).unwrap();
        let value = self.mapper().read_document(mapping, document).unwrap();
        value.as_object().unwrap().clone()
    }

    fn write(&self, object: &ObjectRef) -> Json {
        let mapping = self.registry.get_mapping(self.person).unwrap();
        self.mapper().write_object(mapping, &object.clone().into()).unwrap()
    }

    fn diff(&self, object: &ObjectRef, document: &Json) -> Json {
        let mapping = self.registry.get_mapping(self.person).unwrap();
        self.mapper().diff(mapping, &object.clone().into(), document).to_document()
    }
}

fn person_declaration(person: TypeKey, address: TypeKey) -> TypeDeclaration {
    TypeDeclaration::entity(person, "Person")
        .property(PropertyDeclaration::new("_id", FieldType::scalar(ScalarType::Any)))
        .property(PropertyDeclaration::new("name", FieldType::scalar(ScalarType::String)))
        .property(PropertyDeclaration::new("age", FieldType::scalar(ScalarType::Integer)))
        .property(
            PropertyDeclaration::new("parent", FieldType::reference(person))
                .with(PropertyAnnotation::Nullable),
        )
        .property(PropertyDeclaration::new("address", FieldType::embedded(address)))
        .property(PropertyDeclaration::new(
            "tags",
            FieldType::array(FieldType::scalar(ScalarType::String)),
        ))
}

#[test]
fn test_reference_update_sets_only_the_reference() {
    let ctx = TestContext::new();

    let alice = ObjectRef::new(ctx.person)
        .with("_id", Identifier::new("1"))
        .with("name", "Alice")
        .with("parent", Value::Null);
    let document = ctx.write(&alice);
    assert_eq!(document, json!({"_id": "1", "name": "Alice", "parent": null}));

    let loaded = ctx.read(&document);
    assert_eq!(loaded.get("name").unwrap().as_str(), Some("Alice"));
    assert!(loaded.get("parent").unwrap().is_null());

    loaded.set("parent", ObjectRef::stub(Identifier::new("2")));
    assert_eq!(ctx.diff(&loaded, &document), json!({"$set": {"parent": "2"}}));
}

#[test]
fn test_round_trip_is_stable() {
    let ctx = TestContext::new();
    let document = json!({
        "_id": "7",
        "name": "Bob",
        "age": 40,
        "parent": "3",
        "address": {"street": "Elm St", "city": "Springfield"},
        "tags": ["x", "y"]
    });

    let loaded = ctx.read(&document);
    assert_eq!(ctx.write(&loaded), document);
    assert_eq!(ctx.diff(&loaded, &document), json!({}));
}

#[test]
fn test_diff_is_minimal() {
    let ctx = TestContext::new();
    let document = json!({
        "_id": "7",
        "name": "Bob",
        "age": 40,
        "address": {"street": "Elm St", "city": "Springfield"},
        "tags": ["x"]
    });

    let loaded = ctx.read(&document);
    loaded.set("age", 41);
    loaded.remove("tags");
    let address = loaded.get("address").unwrap();
    address.as_object().unwrap().set("street", "Oak St");

    assert_eq!(
        ctx.diff(&loaded, &document),
        json!({
            "$set": {"age": 41, "address.street": "Oak St"},
            "$unset": {"tags": ""}
        })
    );
}

#[test]
fn test_tracked_entity_ignores_equivalent_reference() {
    let ctx = TestContext::new();
    let document = json!({"_id": "1", "name": "Alice", "parent": "2"});
    let loaded = ctx.read(&document);

    let mut tracked = TrackedEntity::new(ctx.registry.clone(), loaded.clone(), document).unwrap();
    loaded.set("parent", ObjectRef::stub(Identifier::new("2")));
    assert!(tracked.detect_changes().is_none());

    loaded.set("name", "Alicia");
    let changes = tracked.detect_changes().unwrap();
    assert_eq!(changes.get("$set", "name"), Some(&json!("Alicia")));
    assert_eq!(changes.get(INC, "__v"), Some(&json!(1)));
}

#[test]
fn test_observer_on_loaded_graph() {
    let ctx = TestContext::new();
    let loaded = ctx.read(&json!({"_id": "1", "name": "Alice", "tags": ["a"]}));

    let observer = Observer::new(ctx.registry.clone(), || {});
    observer.watch(&loaded.clone().into());

    loaded.set("name", "Alice");
    assert!(!observer.has_pending());

    let tags = loaded.get("tags").unwrap();
    tags.as_list().unwrap().push("b");
    assert!(observer.dispatch());
    assert!(!observer.is_watching());
}

#[test]
fn test_bootstrap_errors() {
    let config = Configuration::new();
    assert!(matches!(config.build_registry(&[]), Err(Error::NoMappings)));

    let (a, b) = (TypeKey::allocate(), TypeKey::allocate());
    let first = DeclarationProvider::new([TypeDeclaration::entity(a, "Person")]);
    let second = DeclarationProvider::new([TypeDeclaration::entity(b, "Person")]);
    assert!(matches!(
        config.build_registry(&[&first, &second]),
        Err(Error::DuplicateCollection { .. })
    ));

    let again = DeclarationProvider::new([TypeDeclaration::entity(a, "Person")
        .annotate(Annotation::Collection {
            name: "people".into(),
            database: None,
        })]);
    assert!(matches!(
        config.build_registry(&[&first, &again]),
        Err(Error::DuplicateMapping { .. })
    ));

    let invalid = DeclarationProvider::new([TypeDeclaration::entity(a, "Person").annotate(
        Annotation::Collection {
            name: String::new(),
            database: None,
        },
    )]);
    match invalid.get_mapping(&config) {
        Err(Error::Validation(report)) => assert!(report.contains("Missing collection name.")),
        other => panic!("expected validation failure, got {other:?}"),
    }
}

proptest! {
    #[test]
    fn prop_scalar_fields_round_trip(name in "\\PC*", age in any::<i64>()) {
        let ctx = TestContext::new();
        let document = json!({"_id": "1", "name": name, "age": age});

        let loaded = ctx.read(&document);
        prop_assert_eq!(ctx.write(&loaded), document.clone());
        prop_assert_eq!(ctx.diff(&loaded, &document), json!({}));
    }
}
