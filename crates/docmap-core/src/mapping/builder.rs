//! Builds validated mappings from type declarations.
//!
//! Declarations describe types and carry annotations. The builder applies
//! configuration defaults, checks every declaration and collects all
//! problems into one [`ValidationReport`] instead of stopping at the first.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::{
    ChangeTracking, ClassMapping, EntityMapping, FieldType, Index, MappingRegistry, Property,
    TypeKey, ID_FIELD,
};
use crate::config::{Configuration, MappingProvider};
use crate::error::{Error, Result};
use crate::identity::IdentityGenerator;

/// Kind of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    /// A root-persisted entity.
    Entity,
    /// A class nested inside entity documents.
    Embeddable,
    /// An anonymous object shape.
    Object,
}

/// A type-level annotation.
#[derive(Debug, Clone)]
pub enum Annotation {
    /// Collection (and optional database) of an entity hierarchy.
    Collection {
        /// Collection name.
        name: String,
        /// Database override.
        database: Option<String>,
    },
    /// Discriminator field of a hierarchy root.
    DiscriminatorField(String),
    /// Discriminator value of a class.
    DiscriminatorValue(String),
    /// Index on the entity's collection.
    Index(Index),
    /// Enable or disable optimistic versioning.
    Versioned(bool),
    /// Version field name.
    VersionField(String),
    /// Enable or disable pessimistic locking.
    Lockable(bool),
    /// Lock field name.
    LockField(String),
    /// Change tracking policy.
    ChangeTracking(ChangeTracking),
    /// Identity generator of the hierarchy.
    Identity(Arc<dyn IdentityGenerator>),
}

impl Annotation {
    /// Annotation name, used as the error location.
    pub fn name(&self) -> &'static str {
        match self {
            Annotation::Collection { .. } => "Collection",
            Annotation::DiscriminatorField(_) => "DiscriminatorField",
            Annotation::DiscriminatorValue(_) => "DiscriminatorValue",
            Annotation::Index(_) => "Index",
            Annotation::Versioned(_) => "Versioned",
            Annotation::VersionField(_) => "VersionField",
            Annotation::Lockable(_) => "Lockable",
            Annotation::LockField(_) => "LockField",
            Annotation::ChangeTracking(_) => "ChangeTracking",
            Annotation::Identity(_) => "Identity",
        }
    }

    fn is_entity_only(&self) -> bool {
        !matches!(
            self,
            Annotation::DiscriminatorField(_) | Annotation::DiscriminatorValue(_)
        )
    }

    fn is_root_only(&self) -> bool {
        matches!(
            self,
            Annotation::Collection { .. }
                | Annotation::Versioned(_)
                | Annotation::VersionField(_)
                | Annotation::Lockable(_)
                | Annotation::LockField(_)
                | Annotation::Identity(_)
        )
    }
}

/// A property-level annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyAnnotation {
    /// Document field name.
    Field(String),
    /// Do not map the property.
    Ignore,
    /// The property may hold null.
    Nullable,
    /// The property holds the entity identifier.
    Identifier,
}

/// A declared property.
#[derive(Debug, Clone)]
pub struct PropertyDeclaration {
    /// Object field name.
    pub name: String,
    /// Declared type.
    pub field_type: FieldType,
    /// Attached annotations.
    pub annotations: Vec<PropertyAnnotation>,
}

impl PropertyDeclaration {
    /// Declare a property.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            annotations: Vec::new(),
        }
    }

    /// Attach an annotation.
    pub fn with(mut self, annotation: PropertyAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// A declared type.
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    /// Type key.
    pub key: TypeKey,
    /// Type name.
    pub name: String,
    /// Declared base type.
    pub base: Option<TypeKey>,
    /// Declaration kind.
    pub kind: DeclarationKind,
    /// Type-level annotations.
    pub annotations: Vec<Annotation>,
    /// Declared properties.
    pub properties: Vec<PropertyDeclaration>,
}

impl TypeDeclaration {
    /// Declare a type.
    pub fn new(key: TypeKey, name: impl Into<String>, kind: DeclarationKind) -> Self {
        Self {
            key,
            name: name.into(),
            base: None,
            kind,
            annotations: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Declare an entity.
    pub fn entity(key: TypeKey, name: impl Into<String>) -> Self {
        Self::new(key, name, DeclarationKind::Entity)
    }

    /// Declare an embeddable class.
    pub fn embeddable(key: TypeKey, name: impl Into<String>) -> Self {
        Self::new(key, name, DeclarationKind::Embeddable)
    }

    /// Declare an anonymous object shape.
    pub fn object(key: TypeKey, name: impl Into<String>) -> Self {
        Self::new(key, name, DeclarationKind::Object)
    }

    /// Set the base type.
    pub fn extends(mut self, base: TypeKey) -> Self {
        self.base = Some(base);
        self
    }

    /// Attach a type-level annotation.
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Add a property.
    pub fn property(mut self, property: PropertyDeclaration) -> Self {
        self.properties.push(property);
        self
    }
}

/// One validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Name of the offending type.
    pub mapping: String,
    /// Offending annotation or property.
    pub location: String,
    /// Description.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.mapping, self.location, self.message)
    }
}

/// All validation problems found in one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[error("mapping validation failed with {} error(s)", .errors.len())]
pub struct ValidationReport {
    /// Collected errors, in discovery order.
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    /// Check if no errors were collected.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check whether any error carries `message`.
    pub fn contains(&self, message: &str) -> bool {
        self.errors.iter().any(|e| e.message == message)
    }

    fn push(&mut self, mapping: &str, location: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            mapping: mapping.to_string(),
            location: location.into(),
            message: message.into(),
        });
    }
}

/// Builds a [`MappingRegistry`] from declarations.
pub struct ClassMappingBuilder<'a> {
    config: &'a Configuration,
    declarations: Vec<TypeDeclaration>,
}

impl<'a> ClassMappingBuilder<'a> {
    /// Create a builder using the defaults of `config`.
    pub fn new(config: &'a Configuration) -> Self {
        Self {
            config,
            declarations: Vec::new(),
        }
    }

    /// Add a declaration.
    pub fn add(&mut self, declaration: TypeDeclaration) -> &mut Self {
        self.declarations.push(declaration);
        self
    }

    /// Builder-style [`add`](Self::add).
    pub fn with_declaration(mut self, declaration: TypeDeclaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    /// Add several declarations.
    pub fn with_declarations(mut self, declarations: impl IntoIterator<Item = TypeDeclaration>) -> Self {
        self.declarations.extend(declarations);
        self
    }

    /// Validate all declarations and build the registry.
    pub fn build(&self) -> std::result::Result<MappingRegistry, ValidationReport> {
        let mut report = ValidationReport::default();

        let mut declared: HashMap<TypeKey, &TypeDeclaration> = HashMap::new();
        for decl in &self.declarations {
            if declared.insert(decl.key, decl).is_some() {
                report.push(&decl.name, "type", "Type is declared more than once.");
            }
        }

        let bases = self.resolve_bases(&declared, &mut report);
        let with_subclasses: HashSet<TypeKey> = bases.values().flatten().copied().collect();

        let mut order: Vec<&TypeDeclaration> = self.declarations.iter().collect();
        order.sort_by_key(|decl| depth(&bases, decl.key));

        let mut built: HashMap<TypeKey, ClassMapping> = HashMap::new();
        let mut build_order = Vec::with_capacity(order.len());
        let mut forwarded_indexes = Vec::new();
        let mut discriminators: HashMap<TypeKey, HashSet<String>> = HashMap::new();

        for decl in order {
            if built.contains_key(&decl.key) {
                continue;
            }
            let base = bases.get(&decl.key).copied().flatten();
            let base_mapping = base.and_then(|key| built.get(&key));

            let mut mapping = self.create_mapping(decl, base_mapping);
            self.apply_annotations(decl, &mut mapping, &mut forwarded_indexes, &mut report);
            self.apply_discriminator_defaults(&mut mapping, with_subclasses.contains(&decl.key));

            if let Some(value) = &mapping.discriminator_value {
                let root_values = discriminators.entry(mapping.inheritance_root).or_default();
                if !root_values.insert(value.clone()) {
                    report.push(
                        &decl.name,
                        "DiscriminatorValue",
                        format!("Duplicate discriminator value '{value}'."),
                    );
                }
            }

            let inherited: Vec<String> = base_mapping
                .map(|b| inherited_fields(&built, b))
                .unwrap_or_default();
            self.add_properties(decl, &declared, &inherited, &mut mapping, &mut report);

            build_order.push(decl.key);
            built.insert(decl.key, mapping);
        }

        if !report.is_empty() {
            debug!(errors = report.errors.len(), "Mapping validation failed");
            return Err(report);
        }

        let mut registry = MappingRegistry::new();
        for key in build_order {
            if let Some(mapping) = built.remove(&key) {
                let name = mapping.name.clone();
                if let Err(err) = registry.add_mapping(mapping) {
                    report.push(&name, "type", err.to_string());
                }
            }
        }
        for (name, key, index) in forwarded_indexes {
            if let Err(err) = registry.add_index(key, index) {
                report.push(&name, "Index", err.to_string());
            }
        }

        if !report.is_empty() {
            return Err(report);
        }
        debug!(mappings = registry.len(), "Built class mappings");
        Ok(registry)
    }

    fn resolve_bases(
        &self,
        declared: &HashMap<TypeKey, &TypeDeclaration>,
        report: &mut ValidationReport,
    ) -> HashMap<TypeKey, Option<TypeKey>> {
        let mut bases = HashMap::new();

        for decl in &self.declarations {
            let resolved = match decl.base {
                None => None,
                Some(_) if decl.kind == DeclarationKind::Object => {
                    report.push(&decl.name, "base", "Only class mappings can have a mapped base class.");
                    None
                }
                Some(base) => match declared.get(&base) {
                    None => {
                        report.push(&decl.name, "base", format!("Base type {base} is not mapped."));
                        None
                    }
                    Some(base_decl) if base_decl.kind != decl.kind => {
                        report.push(
                            &decl.name,
                            "base",
                            format!("Base class '{}' is not of the same kind.", base_decl.name),
                        );
                        None
                    }
                    Some(_) if in_cycle(declared, decl.key) => {
                        report.push(&decl.name, "base", "Inheritance cycle detected.");
                        None
                    }
                    Some(_) => Some(base),
                },
            };
            bases.insert(decl.key, resolved);
        }
        bases
    }

    fn create_mapping(&self, decl: &TypeDeclaration, base: Option<&ClassMapping>) -> ClassMapping {
        let config = self.config;

        let mapping = match decl.kind {
            DeclarationKind::Entity => {
                let entity = match base {
                    None => EntityMapping::root(config.identity_generator.clone())
                        .with_collection(config.collection_naming.apply(&decl.name))
                        .with_root_policy(|policy| {
                            policy.versioned = config.versioned;
                            policy.version_field = config.version_field.clone();
                            policy.lockable = config.lockable;
                            policy.lock_field = config.lock_field.clone();
                        }),
                    Some(base) => {
                        let mut entity = EntityMapping::derived();
                        if let Some(base_entity) = base.entity_mapping() {
                            entity.collection_name = base_entity.collection_name.clone();
                            entity.database_name = base_entity.database_name.clone();
                        }
                        entity
                    }
                };
                ClassMapping::entity(
                    decl.key,
                    &decl.name,
                    entity.with_change_tracking(config.change_tracking),
                )
            }
            DeclarationKind::Embeddable => ClassMapping::embeddable(decl.key, &decl.name),
            DeclarationKind::Object => ClassMapping::object(decl.key, &decl.name),
        };

        match base {
            Some(base) => mapping.derived_from(base),
            None => mapping,
        }
    }

    fn apply_annotations(
        &self,
        decl: &TypeDeclaration,
        mapping: &mut ClassMapping,
        forwarded_indexes: &mut Vec<(String, TypeKey, Index)>,
        report: &mut ValidationReport,
    ) {
        for annotation in &decl.annotations {
            let location = annotation.name();

            if annotation.is_entity_only() && !mapping.is_entity() {
                report.push(&decl.name, location, "Annotation can only be defined on entity mappings.");
                continue;
            }

            if let Annotation::Index(index) = annotation {
                if !mapping.is_inheritance_root() {
                    forwarded_indexes.push((decl.name.clone(), mapping.inheritance_root, index.clone()));
                    continue;
                }
            }

            if annotation.is_root_only() && !mapping.is_inheritance_root() {
                report.push(
                    &decl.name,
                    location,
                    "Annotation can only be defined on the root of an entity hierarchy.",
                );
                continue;
            }

            match annotation {
                Annotation::DiscriminatorField(field) => {
                    if !mapping.is_class() {
                        report.push(&decl.name, location, "Annotation can only be defined on class mappings.");
                    } else if !mapping.is_inheritance_root() {
                        report.push(
                            &decl.name,
                            location,
                            "Annotation can only be defined on classes that are the root of a mapped inheritance hierarchy.",
                        );
                    } else if field.is_empty() {
                        report.push(&decl.name, location, "Missing discriminator field name.");
                    } else {
                        mapping.discriminator_field = Some(field.clone());
                    }
                }
                Annotation::DiscriminatorValue(value) => {
                    if !mapping.is_class() {
                        report.push(&decl.name, location, "Annotation can only be defined on class mappings.");
                    } else if value.is_empty() {
                        report.push(&decl.name, location, "Missing discriminator value.");
                    } else {
                        mapping.discriminator_value = Some(value.clone());
                    }
                }
                Annotation::Collection { name, database } => {
                    if name.is_empty() {
                        report.push(&decl.name, location, "Missing collection name.");
                    } else if let Some(entity) = mapping.entity.as_mut() {
                        entity.collection_name = Some(name.clone());
                        entity.database_name = database.clone();
                    }
                }
                Annotation::ChangeTracking(tracking) => {
                    if let Some(entity) = mapping.entity.as_mut() {
                        entity.change_tracking = *tracking;
                    }
                }
                root_only => {
                    let Some(policy) = mapping.entity.as_mut().and_then(|e| e.root.as_mut()) else {
                        continue;
                    };
                    match root_only {
                        Annotation::Index(index) => policy.indexes.push(index.clone()),
                        Annotation::Versioned(versioned) => policy.versioned = *versioned,
                        Annotation::VersionField(field) if field.is_empty() => {
                            report.push(&decl.name, location, "Missing version field name.");
                        }
                        Annotation::VersionField(field) => policy.version_field = field.clone(),
                        Annotation::Lockable(lockable) => policy.lockable = *lockable,
                        Annotation::LockField(field) if field.is_empty() => {
                            report.push(&decl.name, location, "Missing lock field name.");
                        }
                        Annotation::LockField(field) => policy.lock_field = field.clone(),
                        Annotation::Identity(identity) => policy.identity = identity.clone(),
                        _ => {}
                    }
                }
            }
        }
    }

    fn apply_discriminator_defaults(&self, mapping: &mut ClassMapping, has_subclasses: bool) {
        if !mapping.is_class() {
            return;
        }
        if mapping.is_inheritance_root() && mapping.discriminator_field.is_none() {
            mapping.discriminator_field = Some(self.config.discriminator_field.clone());
        }
        if mapping.discriminator_value.is_none() && (mapping.base.is_some() || has_subclasses) {
            mapping.discriminator_value = Some(self.config.discriminator_naming.apply(&mapping.name));
        }
    }

    fn add_properties(
        &self,
        decl: &TypeDeclaration,
        declared: &HashMap<TypeKey, &TypeDeclaration>,
        inherited: &[String],
        mapping: &mut ClassMapping,
        report: &mut ValidationReport,
    ) {
        let mut fields: HashSet<String> = inherited.iter().cloned().collect();

        for declaration in &decl.properties {
            let location = format!("property {}", declaration.name);
            let mut property = Property::new(&declaration.name, declaration.field_type.clone())
                .with_field(self.config.field_naming.apply(&declaration.name));
            if declaration.name == ID_FIELD {
                property = property.identifier();
            }

            for annotation in &declaration.annotations {
                match annotation {
                    PropertyAnnotation::Field(field) if field.is_empty() => {
                        report.push(&decl.name, &location, "Missing field name.");
                    }
                    PropertyAnnotation::Field(field) => property = property.with_field(field),
                    PropertyAnnotation::Ignore => property = property.ignored(),
                    PropertyAnnotation::Nullable => property = property.nullable(),
                    PropertyAnnotation::Identifier => property = property.identifier(),
                }
            }

            if property.identifier {
                if !mapping.is_entity() {
                    report.push(&decl.name, &location, "Identifier can only be defined on entity mappings.");
                }
                property = property.with_field(ID_FIELD);
            }

            if let Some(target) = declaration.field_type.target() {
                self.check_target(decl, &location, &declaration.field_type, target, declared, report);
            }

            if property.is_mapped() && !fields.insert(property.field.clone()) {
                report.push(
                    &decl.name,
                    &location,
                    format!("Duplicate field name '{}'.", property.field),
                );
            }

            mapping.properties.push(property);
        }
    }

    fn check_target(
        &self,
        decl: &TypeDeclaration,
        location: &str,
        field_type: &FieldType,
        target: TypeKey,
        declared: &HashMap<TypeKey, &TypeDeclaration>,
        report: &mut ValidationReport,
    ) {
        let Some(target_decl) = declared.get(&target) else {
            report.push(&decl.name, location, format!("Type {target} is not mapped."));
            return;
        };

        match field_type.element() {
            FieldType::Reference(_) if target_decl.kind != DeclarationKind::Entity => {
                report.push(
                    &decl.name,
                    location,
                    format!("Referenced type '{}' is not an entity.", target_decl.name),
                );
            }
            FieldType::Embedded(_) if target_decl.kind == DeclarationKind::Entity => {
                report.push(
                    &decl.name,
                    location,
                    format!("Embedded type '{}' cannot be an entity.", target_decl.name),
                );
            }
            _ => {}
        }
    }
}

/// Supplies mappings from a fixed set of declarations.
#[derive(Debug, Clone, Default)]
pub struct DeclarationProvider {
    declarations: Vec<TypeDeclaration>,
}

impl DeclarationProvider {
    /// Create a provider.
    pub fn new(declarations: impl IntoIterator<Item = TypeDeclaration>) -> Self {
        Self {
            declarations: declarations.into_iter().collect(),
        }
    }
}

impl MappingProvider for DeclarationProvider {
    fn get_mapping(&self, config: &Configuration) -> Result<MappingRegistry> {
        ClassMappingBuilder::new(config)
            .with_declarations(self.declarations.iter().cloned())
            .build()
            .map_err(Error::from)
    }
}

fn in_cycle(declared: &HashMap<TypeKey, &TypeDeclaration>, start: TypeKey) -> bool {
    let mut seen = HashSet::new();
    let mut current = declared.get(&start).and_then(|d| d.base);
    while let Some(key) = current {
        if key == start {
            return true;
        }
        if !seen.insert(key) {
            return false;
        }
        current = declared.get(&key).and_then(|d| d.base);
    }
    false
}

fn depth(bases: &HashMap<TypeKey, Option<TypeKey>>, key: TypeKey) -> usize {
    let mut depth = 0;
    let mut current = bases.get(&key).copied().flatten();
    while let Some(k) = current {
        depth += 1;
        if depth > bases.len() {
            break;
        }
        current = bases.get(&k).copied().flatten();
    }
    depth
}

fn inherited_fields(built: &HashMap<TypeKey, ClassMapping>, base: &ClassMapping) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = Some(base);
    while let Some(mapping) = current {
        fields.extend(
            mapping
                .properties
                .iter()
                .filter(|p| p.is_mapped())
                .map(|p| p.field.clone()),
        );
        current = mapping.base.and_then(|key| built.get(&key));
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::UuidGenerator;
    use crate::mapping::ScalarType;

    fn string(name: &str) -> PropertyDeclaration {
        PropertyDeclaration::new(name, FieldType::scalar(ScalarType::String))
    }

    fn build(declarations: Vec<TypeDeclaration>) -> std::result::Result<MappingRegistry, ValidationReport> {
        let config = Configuration::default();
        ClassMappingBuilder::new(&config)
            .with_declarations(declarations)
            .build()
    }

    #[test]
    fn test_entity_defaults() {
        let key = TypeKey::allocate();
        let registry = build(vec![TypeDeclaration::entity(key, "Person")
            .property(PropertyDeclaration::new("_id", FieldType::scalar(ScalarType::Any)))
            .property(string("FirstName"))])
        .unwrap();

        let person = registry.get_mapping(key).unwrap();
        let entity = person.entity_mapping().unwrap();
        assert_eq!(entity.collection_name.as_deref(), Some("person"));
        assert_eq!(person.discriminator_field.as_deref(), Some("__t"));
        assert!(person.discriminator_value.is_none());
        assert!(person.get_property("_id").unwrap().identifier);
        assert_eq!(person.get_property("FirstName").unwrap().field, "firstName");

        let policy = registry.root_policy(key).unwrap();
        assert!(policy.versioned);
        assert!(!policy.lockable);
        assert_eq!(policy.identity.name(), "object-id");
    }

    #[test]
    fn test_hierarchy_discriminator_values_default_to_name() {
        let (animal, dog) = (TypeKey::allocate(), TypeKey::allocate());
        let registry = build(vec![
            TypeDeclaration::entity(dog, "Dog").extends(animal),
            TypeDeclaration::entity(animal, "Animal")
                .annotate(Annotation::Identity(Arc::new(UuidGenerator::new()))),
        ])
        .unwrap();

        assert_eq!(registry.get_mapping(animal).unwrap().discriminator_value.as_deref(), Some("Animal"));
        assert_eq!(registry.get_mapping(dog).unwrap().discriminator_value.as_deref(), Some("Dog"));
        assert_eq!(registry.identity_for(dog).unwrap().name(), "uuid");
        assert_eq!(
            registry.get_mapping(dog).unwrap().entity_mapping().unwrap().collection_name.as_deref(),
            Some("animal")
        );
    }

    #[test]
    fn test_discriminator_annotation_errors_are_collected() {
        let (point, animal, dog) = (TypeKey::allocate(), TypeKey::allocate(), TypeKey::allocate());
        let report = build(vec![
            TypeDeclaration::object(point, "Point")
                .annotate(Annotation::DiscriminatorValue("p".into())),
            TypeDeclaration::entity(animal, "Animal")
                .annotate(Annotation::DiscriminatorField(String::new())),
            TypeDeclaration::entity(dog, "Dog")
                .extends(animal)
                .annotate(Annotation::DiscriminatorField("kind".into()))
                .annotate(Annotation::DiscriminatorValue(String::new())),
        ])
        .unwrap_err();

        assert!(report.contains("Annotation can only be defined on class mappings."));
        assert!(report.contains("Missing discriminator field name."));
        assert!(report.contains(
            "Annotation can only be defined on classes that are the root of a mapped inheritance hierarchy."
        ));
        assert!(report.contains("Missing discriminator value."));
        assert_eq!(report.errors.len(), 4);
    }

    #[test]
    fn test_duplicate_discriminator_value() {
        let (animal, dog, cat) = (TypeKey::allocate(), TypeKey::allocate(), TypeKey::allocate());
        let report = build(vec![
            TypeDeclaration::entity(animal, "Animal"),
            TypeDeclaration::entity(dog, "Dog").extends(animal),
            TypeDeclaration::entity(cat, "Cat")
                .extends(animal)
                .annotate(Annotation::DiscriminatorValue("Dog".into())),
        ])
        .unwrap_err();

        assert!(report.contains("Duplicate discriminator value 'Dog'."));
    }

    #[test]
    fn test_structural_errors() {
        let (person, address, orphan, ghost) = (
            TypeKey::allocate(),
            TypeKey::allocate(),
            TypeKey::allocate(),
            TypeKey::allocate(),
        );
        let report = build(vec![
            TypeDeclaration::entity(person, "Person")
                .property(PropertyDeclaration::new("home", FieldType::reference(address)))
                .property(string("name"))
                .property(string("alias").with(PropertyAnnotation::Field("name".into()))),
            TypeDeclaration::embeddable(address, "Address")
                .annotate(Annotation::Versioned(false))
                .property(PropertyDeclaration::new("owner", FieldType::embedded(person)))
                .property(string("code").with(PropertyAnnotation::Identifier)),
            TypeDeclaration::embeddable(orphan, "Orphan").extends(ghost),
        ])
        .unwrap_err();

        assert!(report.contains("Referenced type 'Address' is not an entity."));
        assert!(report.contains("Duplicate field name 'name'."));
        assert!(report.contains("Annotation can only be defined on entity mappings."));
        assert!(report.contains("Embedded type 'Person' cannot be an entity."));
        assert!(report.contains("Identifier can only be defined on entity mappings."));
        assert!(report.errors.iter().any(|e| e.mapping == "Orphan" && e.location == "base"));
    }

    #[test]
    fn test_inheritance_cycle() {
        let (a, b) = (TypeKey::allocate(), TypeKey::allocate());
        let report = build(vec![
            TypeDeclaration::embeddable(a, "A").extends(b),
            TypeDeclaration::embeddable(b, "B").extends(a),
        ])
        .unwrap_err();

        assert_eq!(
            report.errors.iter().filter(|e| e.message == "Inheritance cycle detected.").count(),
            2
        );
    }

    #[test]
    fn test_root_only_annotation_on_derived_entity() {
        let (animal, dog) = (TypeKey::allocate(), TypeKey::allocate());
        let report = build(vec![
            TypeDeclaration::entity(animal, "Animal"),
            TypeDeclaration::entity(dog, "Dog")
                .extends(animal)
                .annotate(Annotation::Lockable(true)),
        ])
        .unwrap_err();

        assert!(report.contains("Annotation can only be defined on the root of an entity hierarchy."));
    }

    #[test]
    fn test_index_on_derived_entity_is_forwarded() {
        let (animal, dog) = (TypeKey::allocate(), TypeKey::allocate());
        let registry = build(vec![
            TypeDeclaration::entity(animal, "Animal").annotate(Annotation::Index(Index::on("name"))),
            TypeDeclaration::entity(dog, "Dog")
                .extends(animal)
                .annotate(Annotation::Index(Index::on("breed"))),
        ])
        .unwrap();

        assert_eq!(registry.root_policy(dog).unwrap().indexes.len(), 2);
    }

    #[test]
    fn test_provider_reports_validation_error() {
        let key = TypeKey::allocate();
        let provider = DeclarationProvider::new(vec![TypeDeclaration::entity(key, "Person")
            .annotate(Annotation::Collection {
                name: String::new(),
                database: None,
            })]);

        let err = Configuration::default().build_registry(&[&provider]).unwrap_err();
        match err {
            Error::Validation(report) => assert!(report.contains("Missing collection name.")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
