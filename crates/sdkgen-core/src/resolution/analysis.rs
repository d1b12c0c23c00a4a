//! Checks run on the raw description before any code model node exists.
//!
//! Unresolvable references abort the run. Composition problems (multiple
//! inheritance, incompatible redefinitions, conflicting defaults, cycles)
//! only poison the component they appear in, and every component that
//! depends on it.

// Internal imports (std, crate)
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::diagnostics::{Diagnostic, DiagnosticsCollector};
use crate::document::{
    component_schema_name, component_schema_reference, escape_pointer, ApiDocument, Operation,
    PathItem, Schema, SchemaShape,
};
use crate::{Error, Result};

pub const INVALID_SCHEMA: &str = "InvalidSchema";
pub const INVALID_DEPENDENCY: &str = "InvalidDependency";

/// How the members of an `allOf` combine
#[derive(Debug, Clone, Default)]
pub struct AllOfPlan<'a> {
    /// Component inherited from
    pub base: Option<&'a str>,
    /// Schemas whose own properties are merged into the class, in order
    pub sources: Vec<&'a Schema>,
}

impl<'a> AllOfPlan<'a> {
    /// Merged properties, first definition wins
    pub fn properties(&self) -> Vec<(&'a str, &'a Schema)> {
        let mut result: Vec<(&'a str, &'a Schema)> = Vec::new();
        for source in &self.sources {
            for (name, schema) in &source.properties {
                if !result.iter().any(|(existing, _)| *existing == name.as_str()) {
                    result.push((name.as_str(), schema));
                }
            }
        }
        result
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.sources
            .iter()
            .any(|s| s.required.iter().any(|r| r == property))
    }

    /// Unknown properties are accepted only when every source accepts them
    pub fn allows_additional_properties(&self) -> bool {
        self.sources.iter().all(|s| s.allows_additional_properties())
    }
}

/// Result of the pre-analysis
#[derive(Debug)]
pub struct Analysis<'a> {
    document: &'a ApiDocument,
    plans: HashMap<&'a str, AllOfPlan<'a>>,
    poisoned: BTreeMap<String, String>,
}

impl<'a> Analysis<'a> {
    pub fn run(document: &'a ApiDocument, diagnostics: &mut dyn DiagnosticsCollector) -> Result<Self> {
        check_references(document)?;

        let mut analysis = Self {
            document,
            plans: HashMap::new(),
            poisoned: BTreeMap::new(),
        };
        analysis.detect_alias_cycles(diagnostics);
        for name in document.components.schemas.keys() {
            let mut stack = Vec::new();
            analysis.plan_component(name, &mut stack, diagnostics)?;
        }
        analysis.propagate_poison(diagnostics);
        log::debug!(
            "pre-analysis planned {} components, {} invalid",
            analysis.plans.len(),
            analysis.poisoned.len()
        );
        Ok(analysis)
    }

    pub fn document(&self) -> &'a ApiDocument {
        self.document
    }

    pub fn is_poisoned(&self, component: &str) -> bool {
        self.poisoned.contains_key(component)
    }

    /// Invalid components and the reason they were dropped
    pub fn poisoned(&self) -> impl Iterator<Item = (&str, &str)> {
        self.poisoned.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn plan(&self, component: &str) -> Option<&AllOfPlan<'a>> {
        self.plans.get(component)
    }

    /// Plan an inline schema against the already analysed components
    pub fn plan_inline(&self, schema: &'a Schema, pointer: &str) -> Result<AllOfPlan<'a>> {
        let plan = build_plan(self.document, schema, pointer)?;
        if let Some(base) = plan.base {
            if self.is_poisoned(base) {
                return Err(Error::input(
                    pointer,
                    format!("base type '{}' is invalid", base),
                ));
            }
            self.check_against_ancestors(&plan, base, pointer)?;
        }
        Ok(plan)
    }

    /// Properties declared by a component and all of its ancestors
    pub fn hierarchy_properties(&self, component: &str) -> Vec<(&'a str, &'a Schema)> {
        let mut result = Vec::new();
        let mut current = Some(component);
        let mut seen = BTreeSet::new();
        while let Some(name) = current {
            if !seen.insert(name.to_string()) {
                break;
            }
            let Some(plan) = self.plans.get(name) else {
                break;
            };
            result.extend(plan.properties());
            current = plan.base;
        }
        result
    }

    /// Component an alias resolves to, following `$ref`-only schemas
    pub fn alias_target(&self, component: &'a str) -> &'a str {
        let mut current = component;
        let mut seen = BTreeSet::new();
        while let Some(next) = self
            .document
            .components
            .schemas
            .get(current)
            .and_then(alias_of)
        {
            if !seen.insert(current) {
                break;
            }
            current = next;
        }
        current
    }

    /// Verify that an operation only touches valid schemas
    pub fn check_operation(
        &self,
        path_item: &'a PathItem,
        operation: &'a Operation,
        pointer: &str,
    ) -> Result<()> {
        let mut roots: Vec<&'a Schema> = Vec::new();
        for parameter in self
            .document
            .effective_parameters(path_item, operation, pointer)?
        {
            roots.extend(parameter.schema.iter());
        }
        if let Some(body) = &operation.request_body {
            let body = self.document.resolve_request_body(body, pointer)?;
            roots.extend(body.content.values().filter_map(|m| m.schema.as_ref()));
        }
        for response in operation.responses.values() {
            let response = self.document.resolve_response(response, pointer)?;
            roots.extend(response.content.values().filter_map(|m| m.schema.as_ref()));
        }

        let mut nested = Vec::new();
        for root in roots {
            collect_nested(root, &mut nested);
        }
        for schema in nested {
            if let Some(name) = schema.reference.as_deref().and_then(component_schema_name) {
                if self.is_poisoned(&name) {
                    return Err(Error::input(
                        pointer,
                        format!("operation depends on invalid schema '{}'", name),
                    ));
                }
            } else if !schema.all_of.is_empty() {
                self.plan_inline(schema, pointer)?;
            }
        }
        Ok(())
    }

    fn poison(&mut self, name: &str, code: &str, error: &Error, diagnostics: &mut dyn DiagnosticsCollector) {
        if self.poisoned.contains_key(name) {
            return;
        }
        log::debug!("component {} is invalid: {}", name, error);
        diagnostics.report(Diagnostic::from_error(code, error));
        self.poisoned.insert(name.to_string(), error.to_string());
        self.plans.remove(name);
    }

    fn detect_alias_cycles(&mut self, diagnostics: &mut dyn DiagnosticsCollector) {
        let document = self.document;
        for name in document.components.schemas.keys() {
            let mut chain: Vec<&str> = vec![name.as_str()];
            let mut current = name.as_str();
            while let Some(next) = document.components.schemas.get(current).and_then(alias_of) {
                if let Some(start) = chain.iter().position(|c| *c == next) {
                    let members = chain[start..].join(" -> ");
                    for member in chain[start..].to_vec() {
                        let error = Error::input(
                            component_pointer(member),
                            format!("alias cycle {} -> {}", members, next),
                        );
                        self.poison(member, INVALID_SCHEMA, &error, diagnostics);
                    }
                    break;
                }
                chain.push(next);
                current = next;
            }
        }
    }

    /// Plan one component and its ancestors; `Ok(false)` when it is invalid
    fn plan_component(
        &mut self,
        name: &'a str,
        stack: &mut Vec<&'a str>,
        diagnostics: &mut dyn DiagnosticsCollector,
    ) -> Result<bool> {
        if self.is_poisoned(name) {
            return Ok(false);
        }
        if self.plans.contains_key(name) {
            return Ok(true);
        }
        let pointer = component_pointer(name);
        if let Some(start) = stack.iter().position(|s| *s == name) {
            let cycle: Vec<&str> = stack[start..].to_vec();
            let description = format!("cyclic inheritance {} -> {}", cycle.join(" -> "), name);
            for member in cycle {
                let error = Error::input(component_pointer(member), description.clone());
                self.poison(member, INVALID_SCHEMA, &error, diagnostics);
            }
            return Ok(false);
        }
        let Some(schema) = self.document.components.schemas.get(name) else {
            return Ok(false);
        };

        stack.push(name);
        let result = match build_plan(self.document, schema, &pointer) {
            Ok(plan) => match plan.base {
                Some(base) => {
                    let base_valid = self.plan_component(base, stack, diagnostics)?;
                    if !base_valid {
                        Err(Error::input(
                            pointer.clone(),
                            format!("base type '{}' is invalid", base),
                        ))
                    } else {
                        self.check_against_ancestors(&plan, base, &pointer)
                            .map(|_| plan)
                    }
                }
                None => Ok(plan),
            },
            Err(e) => Err(e),
        };
        stack.pop();

        match result {
            Ok(plan) => {
                if !self.is_poisoned(name) {
                    self.plans.insert(name, plan);
                    return Ok(true);
                }
                Ok(false)
            }
            Err(e) if e.is_run_fatal() => Err(e),
            Err(e) => {
                self.poison(name, INVALID_SCHEMA, &e, diagnostics);
                Ok(false)
            }
        }
    }

    fn check_against_ancestors(&self, plan: &AllOfPlan<'a>, base: &str, pointer: &str) -> Result<()> {
        let inherited = self.hierarchy_properties(base);
        for (name, schema) in plan.properties() {
            if let Some((_, ancestor)) = inherited.iter().find(|(n, _)| *n == name) {
                check_redefinition(name, ancestor, schema, pointer)?;
            }
        }
        Ok(())
    }

    fn propagate_poison(&mut self, diagnostics: &mut dyn DiagnosticsCollector) {
        let document = self.document;
        let references: Vec<(&str, BTreeSet<String>)> = document
            .components
            .schemas
            .iter()
            .map(|(name, schema)| (name.as_str(), referenced_components(schema)))
            .collect();
        loop {
            let mut changed = false;
            for (name, referenced) in &references {
                if self.is_poisoned(name) {
                    continue;
                }
                if let Some(bad) = referenced.iter().find(|r| self.is_poisoned(r)) {
                    let error = Error::input(
                        component_pointer(name),
                        format!("depends on invalid schema '{}'", bad),
                    );
                    self.poison(name, INVALID_DEPENDENCY, &error, diagnostics);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }
}

/// Compute the allOf plan of a schema without looking at its ancestors
pub fn build_plan<'a>(document: &'a ApiDocument, schema: &'a Schema, pointer: &str) -> Result<AllOfPlan<'a>> {
    let mut plan = AllOfPlan::default();
    if !schema.all_of.is_empty() {
        let mut references: Vec<(&'a str, &'a Schema)> = Vec::new();
        for member in &schema.all_of {
            if let Some(reference) = &member.reference {
                references.push(document.resolve_schema_reference(reference, pointer)?);
            }
        }
        plan.base = select_base(&references, pointer)?;
        if let Some(base) = plan.base {
            let target = document
                .components
                .schemas
                .get(base)
                .map(|s| resolve_alias_schema(document, s));
            let is_object = target
                .map(|t| {
                    matches!(
                        t.shape(),
                        SchemaShape::Object | SchemaShape::Union | SchemaShape::Intersection
                    )
                })
                .unwrap_or(false);
            if !is_object {
                return Err(Error::input(
                    pointer,
                    format!("base type '{}' is not an object schema", base),
                ));
            }
        }
        let mut visited = Vec::new();
        for (index, member) in schema.all_of.iter().enumerate() {
            let member_pointer = format!("{}/allOf/{}", pointer, index);
            match &member.reference {
                Some(reference) => {
                    let (name, target) = document.resolve_schema_reference(reference, pointer)?;
                    if Some(name) == plan.base {
                        continue;
                    }
                    visited.push(name);
                    flatten(document, target, &member_pointer, &mut plan.sources, &mut visited)?;
                }
                None => flatten(document, member, &member_pointer, &mut plan.sources, &mut visited)?,
            }
        }
    }
    plan.sources.push(schema);
    check_sources(&plan.sources, pointer)?;
    Ok(plan)
}

fn select_base<'a>(references: &[(&'a str, &'a Schema)], pointer: &str) -> Result<Option<&'a str>> {
    match references {
        [] => Ok(None),
        [(name, _)] => Ok(Some(*name)),
        _ => {
            let candidates: Vec<&str> = references
                .iter()
                .filter(|(_, target)| target.discriminator.is_some() || !target.all_of.is_empty())
                .map(|(name, _)| *name)
                .collect();
            match candidates.as_slice() {
                [] => Ok(None),
                [single] => Ok(Some(*single)),
                many => Err(Error::input(
                    pointer,
                    format!(
                        "multiple inheritance is not supported: {} are all base type candidates",
                        many.join(", ")
                    ),
                )),
            }
        }
    }
}

fn flatten<'a>(
    document: &'a ApiDocument,
    schema: &'a Schema,
    pointer: &str,
    sources: &mut Vec<&'a Schema>,
    visited: &mut Vec<&'a str>,
) -> Result<()> {
    for (index, member) in schema.all_of.iter().enumerate() {
        let member_pointer = format!("{}/allOf/{}", pointer, index);
        match &member.reference {
            Some(reference) => {
                let (name, target) = document.resolve_schema_reference(reference, pointer)?;
                if visited.contains(&name) {
                    return Err(Error::input(
                        pointer,
                        format!("cyclic allOf through '{}'", name),
                    ));
                }
                visited.push(name);
                flatten(document, target, &member_pointer, sources, visited)?;
            }
            None => flatten(document, member, &member_pointer, sources, visited)?,
        }
    }
    sources.push(schema);
    Ok(())
}

fn check_sources(sources: &[&Schema], pointer: &str) -> Result<()> {
    let mut seen: Vec<(&str, &Schema)> = Vec::new();
    for source in sources {
        for (name, schema) in &source.properties {
            match seen.iter().find(|(n, _)| *n == name.as_str()) {
                Some((_, first)) => check_redefinition(name, first, schema, pointer)?,
                None => seen.push((name.as_str(), schema)),
            }
        }
    }
    Ok(())
}

fn check_redefinition(name: &str, first: &Schema, second: &Schema, pointer: &str) -> Result<()> {
    if first.signature() != second.signature() {
        return Err(Error::input(
            format!("{}/properties/{}", pointer, escape_pointer(name)),
            format!("property '{}' is redefined with an incompatible type", name),
        ));
    }
    if let (Some(a), Some(b)) = (&first.default, &second.default) {
        if a != b {
            return Err(Error::input(
                format!("{}/properties/{}", pointer, escape_pointer(name)),
                format!(
                    "conflicting default values for property '{}': {} and {}",
                    name, a, b
                ),
            ));
        }
    }
    Ok(())
}

/// Target of a `$ref`-only or single-member allOf schema
pub fn alias_of(schema: &Schema) -> Option<&str> {
    let reference = schema
        .reference
        .as_deref()
        .or_else(|| schema.single_all_of_alias().and_then(|m| m.reference.as_deref()))?;
    reference.strip_prefix("#/components/schemas/")
}

fn resolve_alias_schema<'a>(document: &'a ApiDocument, schema: &'a Schema) -> &'a Schema {
    let mut current = schema;
    for _ in 0..document.components.schemas.len() {
        let Some(name) = current
            .reference
            .as_deref()
            .or_else(|| current.single_all_of_alias().and_then(|m| m.reference.as_deref()))
            .and_then(component_schema_name)
        else {
            break;
        };
        match document.components.schemas.get(&name) {
            Some(next) => current = next,
            None => break,
        }
    }
    current
}

/// Every schema nested in `schema`, itself included
pub fn collect_nested<'a>(schema: &'a Schema, out: &mut Vec<&'a Schema>) {
    out.push(schema);
    for property in schema.properties.values() {
        collect_nested(property, out);
    }
    if let Some(items) = &schema.items {
        collect_nested(items, out);
    }
    if let Some(crate::document::AdditionalProperties::Schema(additional)) = &schema.additional_properties {
        collect_nested(additional, out);
    }
    for member in schema.all_of.iter().chain(&schema.one_of).chain(&schema.any_of) {
        collect_nested(member, out);
    }
}

/// Names of the components a schema refers to
pub fn referenced_components(schema: &Schema) -> BTreeSet<String> {
    let mut nested = Vec::new();
    collect_nested(schema, &mut nested);
    nested
        .into_iter()
        .filter_map(|s| s.reference.as_deref().and_then(component_schema_name))
        .collect()
}

pub fn component_pointer(name: &str) -> String {
    component_schema_reference(name)
}

/// Every `$ref` in the description must point at something
fn check_references(document: &ApiDocument) -> Result<()> {
    let mut failure: Option<Error> = None;
    document.for_each_schema(|pointer, schema| {
        if failure.is_some() {
            return;
        }
        if let Some(reference) = &schema.reference {
            if let Err(e) = document.resolve_schema_reference(reference, pointer) {
                failure = Some(e);
                return;
            }
        }
        if let Some(discriminator) = &schema.discriminator {
            for target in discriminator.mapping.values() {
                if discriminator_target(document, target).is_none() {
                    failure = Some(Error::UnresolvedReference {
                        reference: target.clone(),
                        pointer: format!("{}/discriminator", pointer),
                    });
                    return;
                }
            }
        }
    });
    if let Some(e) = failure {
        return Err(e);
    }

    for (path, item) in &document.paths {
        let pointer = format!("#/paths/{}", escape_pointer(path));
        for parameter in &item.parameters {
            document.resolve_parameter(parameter, &pointer)?;
        }
        for (method, operation) in item.operations() {
            let pointer = format!("{}/{}", pointer, method.as_str().to_lowercase());
            document.effective_parameters(item, operation, &pointer)?;
            if let Some(body) = &operation.request_body {
                document.resolve_request_body(body, &pointer)?;
            }
            for response in operation.responses.values() {
                document.resolve_response(response, &pointer)?;
            }
        }
    }
    Ok(())
}

/// Component named by a discriminator mapping value (`#/components/schemas/X` or `X`)
pub fn discriminator_target<'a>(document: &'a ApiDocument, value: &str) -> Option<&'a str> {
    let name = component_schema_name(value).unwrap_or_else(|| value.to_string());
    document
        .components
        .schemas
        .get_key_value(name.as_str())
        .map(|(k, _)| k.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use serde_json::{json, Value as JsonValue};

    fn document(schemas: JsonValue) -> ApiDocument {
        ApiDocument::from_json_value(json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {},
            "components": {"schemas": schemas}
        }))
        .unwrap()
    }

    #[test]
    fn test_single_reference_is_the_base() {
        let doc = document(json!({
            "Base": {"type": "object", "properties": {"id": {"type": "string"}}},
            "Derived": {"allOf": [
                {"$ref": "#/components/schemas/Base"},
                {"type": "object", "properties": {"name": {"type": "string"}}}
            ]}
        }));
        let mut diagnostics = Diagnostics::new();
        let analysis = Analysis::run(&doc, &mut diagnostics).unwrap();
        let plan = analysis.plan("Derived").unwrap();
        assert_eq!(plan.base, Some("Base"));
        let names: Vec<_> = plan.properties().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["name"]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_multiple_inheritance_poisons_dependents() {
        let doc = document(json!({
            "A": {"type": "object", "discriminator": {"propertyName": "kind"}, "properties": {"kind": {"type": "string"}}},
            "B": {"type": "object", "discriminator": {"propertyName": "kind"}, "properties": {"kind": {"type": "string"}}},
            "C": {"allOf": [{"$ref": "#/components/schemas/A"}, {"$ref": "#/components/schemas/B"}]},
            "Holder": {"type": "object", "properties": {"c": {"$ref": "#/components/schemas/C"}}},
            "Unrelated": {"type": "object", "properties": {"x": {"type": "string"}}}
        }));
        let mut diagnostics = Diagnostics::new();
        let analysis = Analysis::run(&doc, &mut diagnostics).unwrap();
        assert!(analysis.is_poisoned("C"));
        assert!(analysis.is_poisoned("Holder"));
        assert!(!analysis.is_poisoned("Unrelated"));
        assert!(diagnostics.contains_code(INVALID_SCHEMA));
        assert!(diagnostics.contains_code(INVALID_DEPENDENCY));
        let error = diagnostics.errors().next().unwrap();
        assert_eq!(error.pointer.as_deref(), Some("#/components/schemas/C"));
    }

    #[test]
    fn test_flattening_without_base_candidates() {
        let doc = document(json!({
            "A": {"type": "object", "properties": {"a": {"type": "string"}}},
            "B": {"type": "object", "properties": {"b": {"type": "integer"}}},
            "C": {"allOf": [{"$ref": "#/components/schemas/A"}, {"$ref": "#/components/schemas/B"}]}
        }));
        let mut diagnostics = Diagnostics::new();
        let analysis = Analysis::run(&doc, &mut diagnostics).unwrap();
        let plan = analysis.plan("C").unwrap();
        assert_eq!(plan.base, None);
        let names: Vec<_> = plan.properties().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_incompatible_redefinition() {
        let doc = document(json!({
            "C": {"allOf": [
                {"properties": {"x": {"type": "string"}}},
                {"properties": {"x": {"type": "integer"}}}
            ]}
        }));
        let mut diagnostics = Diagnostics::new();
        let analysis = Analysis::run(&doc, &mut diagnostics).unwrap();
        assert!(analysis.is_poisoned("C"));
        assert!(diagnostics
            .errors()
            .any(|d| d.message.contains("incompatible type")));
    }

    #[test]
    fn test_conflicting_defaults_are_input_errors() {
        let doc = document(json!({
            "C": {"allOf": [
                {"properties": {"x": {"type": "string", "default": "a"}}},
                {"properties": {"x": {"type": "string", "default": "b"}}}
            ]}
        }));
        let mut diagnostics = Diagnostics::new();
        let analysis = Analysis::run(&doc, &mut diagnostics).unwrap();
        assert!(analysis.is_poisoned("C"));
        assert!(diagnostics
            .errors()
            .any(|d| d.message.contains("conflicting default values")));
    }

    #[test]
    fn test_cycles_are_detected() {
        let doc = document(json!({
            "A": {"allOf": [{"$ref": "#/components/schemas/B"}, {"properties": {"a": {"type": "string"}}}]},
            "B": {"allOf": [{"$ref": "#/components/schemas/A"}, {"properties": {"b": {"type": "string"}}}]},
            "X": {"$ref": "#/components/schemas/Y"},
            "Y": {"$ref": "#/components/schemas/X"}
        }));
        let mut diagnostics = Diagnostics::new();
        let analysis = Analysis::run(&doc, &mut diagnostics).unwrap();
        for name in ["A", "B", "X", "Y"] {
            assert!(analysis.is_poisoned(name), "{} should be invalid", name);
        }
    }

    #[test]
    fn test_unresolved_reference_is_fatal() {
        let doc = document(json!({
            "A": {"type": "object", "properties": {"b": {"$ref": "#/components/schemas/Missing"}}}
        }));
        let mut diagnostics = Diagnostics::new();
        let err = Analysis::run(&doc, &mut diagnostics).unwrap_err();
        assert!(matches!(err, Error::UnresolvedReference { .. }));
    }

    #[test]
    fn test_redefinition_of_ancestor_property() {
        let doc = document(json!({
            "Base": {"type": "object", "properties": {"x": {"type": "string"}}},
            "Good": {"allOf": [{"$ref": "#/components/schemas/Base"}, {"properties": {"x": {"type": "string", "description": "same"}}}]},
            "Bad": {"allOf": [{"$ref": "#/components/schemas/Base"}, {"properties": {"x": {"type": "boolean"}}}]}
        }));
        let mut diagnostics = Diagnostics::new();
        let analysis = Analysis::run(&doc, &mut diagnostics).unwrap();
        assert!(!analysis.is_poisoned("Good"));
        assert!(analysis.is_poisoned("Bad"));
        let inherited: Vec<_> = analysis.hierarchy_properties("Good").into_iter().map(|(n, _)| n).collect();
        assert_eq!(inherited, ["x", "x"]);
    }
}
