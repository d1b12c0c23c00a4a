//! Model classes: allocation, allOf flattening and structural members.

use super::analysis::AllOfPlan;
use super::{schema_documentation, type_name, InlineScope, Resolver};
use crate::document::{escape_pointer, Schema};
use crate::ir::{
    Abstraction, Access, Class, ClassId, ClassKind, Deprecation, Documentation, Method,
    MethodKind, Parameter, ParameterKind, Primitive, Property, PropertyKind, TypeRef,
};
use crate::naming::{avoid_structural_names, cleanup_symbol_name, to_first_lower};
use crate::{Error, Result};

impl<'a, 'd> Resolver<'a, 'd> {
    /// Declare an empty model class; it is populated separately so that
    /// recursive references can already point at it
    pub(super) fn allocate_model(&mut self, scope: &InlineScope, schema: &'a Schema) -> Result<ClassId> {
        let name = self
            .model
            .unique_type_name(scope.namespace, &type_name(&scope.name));
        let mut class = Class::new(name, ClassKind::Model);
        class.documentation = schema_documentation(schema);
        class.deprecation =
            Deprecation::from_schema(schema.deprecated, schema.extension("x-ms-deprecation"));
        let id = self.model.add_class(scope.namespace, class)?;
        self.schemas.insert(id, schema);
        Ok(id)
    }

    /// Fill a model with its base type and merged properties
    pub(super) fn populate_model(
        &mut self,
        id: ClassId,
        plan: &AllOfPlan<'a>,
        pointer: &str,
    ) -> Result<()> {
        if let Some(base) = plan.base {
            let base_ref = self.resolve_component(base)?;
            if base_ref.class_id().is_none() {
                return Err(Error::input(
                    pointer,
                    format!("base type '{}' does not generate a class", base),
                ));
            }
            self.model.class_mut(id).base = Some(base_ref.with_nullable(false));
        }

        let class_name = self.model.class(id).name.clone();
        let namespace = self.model.class(id).namespace();
        for (wire_name, property_schema) in plan.properties() {
            let property_pointer = format!("{}/properties/{}", pointer, escape_pointer(wire_name));
            let scope = InlineScope::new(
                namespace,
                format!("{}_{}", class_name, cleanup_symbol_name(wire_name)),
            );
            let type_ref = self.resolve_schema(property_schema, &scope, &property_pointer)?;
            let nullable = type_ref.nullable
                || !plan.is_required(wire_name)
                || property_schema.is_nullable();

            let name = avoid_structural_names(to_first_lower(&cleanup_symbol_name(wire_name)));
            let mut property = Property::new(name, PropertyKind::Custom, type_ref.with_nullable(nullable))
                .with_serialization_name(wire_name)
                .with_documentation(schema_documentation(property_schema));
            property.read_only = property_schema.read_only;
            property.default_value = property_schema.default.clone();
            property.deprecation = Deprecation::from_schema(
                property_schema.deprecated,
                property_schema.extension("x-ms-deprecation"),
            );
            self.add_unique_property(id, property);
        }

        self.open_models
            .insert(id, plan.allows_additional_properties());
        Ok(())
    }

    /// Add a property, suffixing its name when a cleaned-up name collides
    pub(super) fn add_unique_property(&mut self, id: ClassId, property: Property) {
        let class = self.model.class_mut(id);
        if class.property(&property.name).is_none() {
            class.add_property(property);
            return;
        }
        let mut counter = 1;
        loop {
            let candidate = format!("{}{}", property.name, counter);
            if class.property(&candidate).is_none() {
                class.add_property(Property {
                    name: candidate,
                    ..property
                });
                return;
            }
            counter += 1;
        }
    }

    /// Serialization plumbing on every model, base classes first
    pub(super) fn add_structural_members(&mut self) {
        let mut ids: Vec<ClassId> = self
            .model
            .classes()
            .filter(|(_, class)| class.kind == ClassKind::Model)
            .map(|(id, _)| id)
            .collect();
        ids.sort_by_key(|id| self.model.ancestors(*id).len());

        for id in ids {
            let ancestors = self.model.ancestors(id);
            let inherited = |kind: PropertyKind| {
                ancestors
                    .iter()
                    .any(|a| self.model.class(*a).has_property_of_kind(kind))
            };
            let add_additional_data = !self.model.class(id).is_wrapper()
                && self.config.include_additional_data
                && self.open_models.get(&id).copied().unwrap_or(true)
                && !inherited(PropertyKind::AdditionalData);
            let add_backing_store = !self.model.class(id).is_wrapper()
                && self.config.uses_backing_store
                && !inherited(PropertyKind::BackingStore);

            let class_ref = TypeRef::class(self.model.class(id).name.clone(), id);
            let class = self.model.class_mut(id);

            if add_additional_data {
                class.add_property(
                    Property::new(
                        "additionalData",
                        PropertyKind::AdditionalData,
                        TypeRef::abstraction(Abstraction::AdditionalData),
                    )
                    .with_documentation(Documentation::new(Some(
                        "Stores additional data not described in the description found when deserializing.",
                    ))),
                );
                class.add_implements(TypeRef::abstraction(Abstraction::AdditionalDataHolder));
            }
            if add_backing_store {
                class.add_property(
                    Property::new(
                        "backingStore",
                        PropertyKind::BackingStore,
                        TypeRef::abstraction(Abstraction::BackingStore),
                    )
                    .with_access(Access::Private)
                    .with_documentation(Documentation::new(Some(
                        "Stores model information.",
                    ))),
                );
                class.add_implements(TypeRef::abstraction(Abstraction::BackedModel));
            }
            if class.is_wrapper() {
                class.add_implements(TypeRef::abstraction(Abstraction::ComposedTypeWrapper));
            }
            if class.base.is_none() {
                class.add_implements(TypeRef::abstraction(Abstraction::Parsable));
            }

            class.add_method(
                Method::new(
                    "getFieldDeserializers",
                    MethodKind::Deserializer,
                    TypeRef::primitive(Primitive::Void),
                )
                .with_documentation(Documentation::new(Some(
                    "The deserialization information for the current model",
                ))),
            );
            class.add_method(
                Method::new(
                    "serialize",
                    MethodKind::Serializer,
                    TypeRef::primitive(Primitive::Void),
                )
                .with_parameter(Parameter::new(
                    "writer",
                    ParameterKind::Serializer,
                    TypeRef::abstraction(Abstraction::SerializationWriter),
                ))
                .with_documentation(Documentation::new(Some(
                    "Serializes information the current object",
                ))),
            );
            let mut factory = Method::new(
                "createFromDiscriminatorValue",
                MethodKind::Factory,
                class_ref,
            )
            .with_parameter(Parameter::new(
                "parseNode",
                ParameterKind::ParseNode,
                TypeRef::abstraction(Abstraction::ParseNode),
            ))
            .with_documentation(Documentation::new(Some(
                "Creates a new instance of the appropriate class based on discriminator value",
            )));
            factory.is_static = true;
            class.add_method(factory);

            let needs_constructor = !class.is_wrapper()
                && class.properties().iter().any(|p| {
                    p.default_value.is_some()
                        || matches!(p.kind, PropertyKind::AdditionalData | PropertyKind::BackingStore)
                });
            if needs_constructor {
                class.add_method(
                    Method::new("constructor", MethodKind::Constructor, TypeRef::primitive(Primitive::Void))
                        .with_documentation(Documentation::new(Some(
                            "Instantiates a new model and sets the default values.",
                        ))),
                );
            }
        }
    }
}
