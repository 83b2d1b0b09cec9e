//! docmap walkthrough.
//!
//! Declares a small `Person`/`Address` model, loads a document, mutates the
//! live object and prints the update documents produced along the way. Run
//! with `RUST_LOG=docmap_core=debug` to see the mapper's tracing output.

use std::sync::Arc;

use docmap::prelude::*;
use docmap::UnresolvedReferences;
use serde_json::json;
use tracing::info;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("docmap_demo=info".parse().unwrap()),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (person, address) = (TypeKey::allocate(), TypeKey::allocate());
    let config = Configuration::new().with_identity_generator(Arc::new(UuidGenerator::new()));

    let registry = Arc::new(bootstrap(
        &config,
        [
            TypeDeclaration::embeddable(address, "Address")
                .property(PropertyDeclaration::new("street", FieldType::scalar(ScalarType::String)))
                .property(PropertyDeclaration::new("city", FieldType::scalar(ScalarType::String))),
            TypeDeclaration::entity(person, "Person")
                .property(PropertyDeclaration::new("_id", FieldType::scalar(ScalarType::Any)))
                .property(PropertyDeclaration::new("name", FieldType::scalar(ScalarType::String)))
                .property(
                    PropertyDeclaration::new("parent", FieldType::reference(person))
                        .with(PropertyAnnotation::Nullable),
                )
                .property(PropertyDeclaration::new("address", FieldType::embedded(address)))
                .property(PropertyDeclaration::new(
                    "tags",
                    FieldType::array(FieldType::scalar(ScalarType::String)),
                )),
        ],
    )?);
    info!(mappings = registry.len(), "Registry ready");

    let mapping = registry
        .get_mapping(person)
        .ok_or("Person is not mapped")?;
    let mapper = Mapper::new(&registry);

    let generator = UuidGenerator::new();
    let (id, parent) = (generator.generate(), generator.generate());
    let document: Document = json!({
        "_id": id.to_document(),
        "name": "Alice",
        "parent": null,
        "address": {"street": "Main St", "city": "Springfield"},
        "tags": ["admin"]
    });

    let loaded = mapper.read_document(mapping, &document)?;
    let alice = loaded.as_object().ok_or("Person did not read as an object")?;
    let mut tracked = TrackedEntity::new(registry.clone(), alice.clone(), document.clone())?;

    alice.set("parent", parent.clone());
    if let Some(address) = alice.get("address").as_ref().and_then(Value::as_object) {
        address.set("city", "Shelbyville");
    }
    if let Some(tags) = alice.get("tags").as_ref().and_then(Value::as_list) {
        tags.push("editor");
    }

    match tracked.detect_changes() {
        Some(changes) => {
            info!(operations = changes.len(), "Changes detected");
            println!("{}", serde_json::to_string_pretty(&changes.to_document())?);
        }
        None => println!("no changes"),
    }

    // A stub carrying an equivalent identifier does not count as a change.
    let written = mapper.write_object(mapping, &loaded)?;
    tracked.accept(written.clone());
    let upper = Identifier::new(generator.format(&parent).to_uppercase());
    alice.set("parent", ObjectRef::stub(upper));
    println!("after equivalent reassignment: {:?}", tracked.detect_changes().map(|c| c.to_document()));

    // References that cannot be resolved are reported rather than written.
    alice.set("parent", ObjectRef::new(person).with("name", "Nobody"));
    let changes = mapper
        .with_options(docmap::CompareOptions::default().with_unresolved_references(UnresolvedReferences::Report))
        .diff(mapping, &loaded, &written);
    println!("unresolved: {:?}", changes.unresolved());

    Ok(())
}
