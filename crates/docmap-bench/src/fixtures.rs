//! Test data generation for benchmarks.
//!
//! Generators are seeded so every run sees the same documents.

use std::sync::Arc;

use docmap_core::{
    ClassMappingBuilder, Configuration, FieldType, MappingRegistry, PropertyAnnotation,
    PropertyDeclaration, ScalarType, TypeDeclaration, TypeKey,
};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value as Json};

/// Scale factor for benchmark data generation.
#[derive(Clone, Copy, Debug, Default)]
pub enum Scale {
    /// 10 documents.
    Tiny,
    /// 100 documents.
    #[default]
    Small,
    /// 2,000 documents.
    Medium,
}

impl Scale {
    /// Get the document count for this scale.
    pub fn count(&self) -> usize {
        match self {
            Scale::Tiny => 10,
            Scale::Small => 100,
            Scale::Medium => 2_000,
        }
    }
}

/// The benchmark mappings.
pub struct Schema {
    pub registry: Arc<MappingRegistry>,
    pub user: TypeKey,
    pub address: TypeKey,
}

impl Schema {
    /// Build the `User`/`Address` mappings with default configuration.
    pub fn new() -> Self {
        let (user, address) = (TypeKey::allocate(), TypeKey::allocate());
        let string = || FieldType::scalar(ScalarType::String);

        let registry = ClassMappingBuilder::new(&Configuration::new())
            .with_declarations([
                TypeDeclaration::embeddable(address, "Address")
                    .property(PropertyDeclaration::new("street", string()))
                    .property(PropertyDeclaration::new("city", string())),
                TypeDeclaration::entity(user, "User")
                    .property(PropertyDeclaration::new("_id", FieldType::scalar(ScalarType::Any)))
                    .property(PropertyDeclaration::new("name", string()))
                    .property(PropertyDeclaration::new("email", string()))
                    .property(PropertyDeclaration::new("age", FieldType::scalar(ScalarType::Integer)))
                    .property(PropertyDeclaration::new("status", string()))
                    .property(
                        PropertyDeclaration::new("manager", FieldType::reference(user))
                            .with(PropertyAnnotation::Nullable),
                    )
                    .property(PropertyDeclaration::new("address", FieldType::embedded(address)))
                    .property(PropertyDeclaration::new("tags", FieldType::array(string()))),
            ])
            .build()
            .expect("benchmark schema is valid");

        Self {
            registry: Arc::new(registry),
            user,
            address,
        }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

/// User document data for benchmarks.
pub struct UserData {
    pub id: String,
    pub name: String,
    pub email: String,
    pub age: i64,
    pub status: String,
    pub manager: Option<String>,
    pub street: String,
    pub city: String,
    pub tags: Vec<String>,
}

/// Generate a deterministic 12-byte object id.
fn generate_object_id(rng: &mut StdRng) -> String {
    hex::encode(rng.gen::<[u8; 12]>())
}

/// Generate a random string of specified length.
fn random_string(rng: &mut StdRng, len: usize) -> String {
    (0..len).map(|_| rng.sample(Alphanumeric) as char).collect()
}

/// Generate users; every user after the first is managed by an earlier one.
pub fn generate_users(count: usize) -> Vec<UserData> {
    const SEED: u64 = 12345;
    let mut rng = StdRng::seed_from_u64(SEED);

    let statuses = ["active", "inactive", "pending", "admin"];
    let name_prefixes = [
        "Alice", "Bob", "Charlie", "David", "Eve", "Frank", "Grace", "Henry", "Ivy", "Jack",
    ];

    let mut users: Vec<UserData> = Vec::with_capacity(count);
    for i in 0..count {
        let manager = (i > 0).then(|| users[rng.gen_range(0..i)].id.clone());
        let tag_count = rng.gen_range(0..5);

        users.push(UserData {
            id: generate_object_id(&mut rng),
            name: format!("{}_{}", name_prefixes[i % name_prefixes.len()], i),
            email: format!("user{}@example{}.com", i, i % 10),
            age: 18 + rng.gen_range(0..60),
            status: statuses[i % statuses.len()].to_string(),
            manager,
            street: format!("{} {} St", i, random_string(&mut rng, 8)),
            city: random_string(&mut rng, 10),
            tags: (0..tag_count).map(|_| random_string(&mut rng, 6)).collect(),
        });
    }
    users
}

/// Convert UserData to its persisted document.
pub fn user_to_document(user: &UserData) -> Json {
    json!({
        "_id": user.id,
        "name": user.name,
        "email": user.email,
        "age": user.age,
        "status": user.status,
        "manager": user.manager,
        "address": {"street": user.street, "city": user.city},
        "tags": user.tags,
    })
}
