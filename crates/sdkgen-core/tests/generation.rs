//! End-to-end generation tests over the store fixture

mod test_utils;

use std::collections::HashSet;

use anyhow::{Context, Result};
use sdkgen_core::ir::{ComposedKind, MethodKind};
use sdkgen_core::{generate_document, CancellationFlag, GenerationLanguage};
use serde_json::json;
use test_utils::*;

const MODELS: &str = "ApiSdk.models";

#[tokio::test]
async fn test_generation_is_idempotent() -> Result<()> {
    let document = store_document().await?;
    let config = all_languages_config();

    let first = render_all(&document, &config).await?;
    let second = render_all(&document, &config).await?;

    assert_eq!(first.len(), 4);
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn test_rewriting_identical_output_touches_nothing() -> Result<()> {
    let document = store_document().await?;
    let (_dir, root) = create_temp_dir()?;
    let mut config = all_languages_config();
    config.output_path = root.to_string_lossy().into_owned();

    let first = generate_document(&document, &config, &CancellationFlag::new()).await?;
    let second = generate_document(&document, &config, &CancellationFlag::new()).await?;

    for (before, after) in first.outputs.iter().zip(&second.outputs) {
        assert!(!before.summary.written.is_empty());
        assert!(after.summary.written.is_empty());
        assert_eq!(before.summary.total(), after.summary.unchanged.len());
    }
    assert!(root.join("csharp").join("ApiClient.cs").exists());
    assert!(root.join("python").join("api_client.py").exists());
    Ok(())
}

#[tokio::test]
async fn test_output_paths_are_distinct_and_complete() -> Result<()> {
    let document = store_document().await?;
    for output in render_all(&document, &all_languages_config()).await? {
        let mut seen = HashSet::new();
        for (path, content) in &output.files {
            assert!(
                seen.insert(path.to_lowercase()),
                "{} renders {} twice",
                output.language,
                path
            );
            assert!(content.ends_with('\n'), "{} has no trailing newline", path);
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_discriminator_switch_needs_two_mappings() -> Result<()> {
    let document = store_document().await?;
    let (model, _) = build_model(&document)?;
    assert!(class_named(&model, MODELS, "Pet")?.emits_discriminator_switch());
    assert!(!class_named(&model, MODELS, "Vehicle")?.emits_discriminator_switch());

    let outputs = render_all(&document, &all_languages_config()).await?;
    for output in &outputs {
        let (pet, vehicle, marker) = match output.language {
            GenerationLanguage::CSharp => ("Models/Pet.cs", "Models/Vehicle.cs", "mappingValue"),
            GenerationLanguage::Java => ("models/Pet.java", "models/Vehicle.java", "mappingValue"),
            GenerationLanguage::TypeScript => ("models/pet.ts", "models/vehicle.ts", "mappingValue"),
            GenerationLanguage::Python => ("models/pet.py", "models/vehicle.py", "mapping_value"),
        };
        assert!(file(output, pet)?.contains(marker), "{} Pet has no switch", output.language);
        assert!(
            !file(output, vehicle)?.contains(marker),
            "{} Vehicle switches on a single mapping",
            output.language
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_every_mapping_resolves_to_a_class() -> Result<()> {
    let document = store_document().await?;
    let (model, _) = build_model(&document)?;

    let mut checked = 0;
    for (_, class) in model.classes() {
        let Some(info) = &class.discriminator else {
            continue;
        };
        let mut values = HashSet::new();
        for (value, type_ref) in info.mappings() {
            assert!(values.insert(value.to_lowercase()), "{} maps {} twice", class.name, value);
            let id = type_ref
                .class_id()
                .with_context(|| format!("{} -> {} is not linked", value, type_ref.name))?;
            assert_eq!(model.class(id).name, type_ref.name);
            checked += 1;
        }
    }
    assert!(checked >= 5);
    Ok(())
}

#[tokio::test]
async fn test_union_with_discriminator() -> Result<()> {
    let document = store_document().await?;
    let (model, _) = build_model(&document)?;

    let shape = class_named(&model, MODELS, "Shape")?;
    assert!(shape.is_wrapper());
    let composed = shape.composed_type.as_ref().context("Shape is not composed")?;
    assert_eq!(composed.kind, ComposedKind::Union);
    let info = shape.discriminator.as_ref().context("Shape has no discriminator")?;
    assert_eq!(info.property_name, "type");
    let mappings: Vec<_> = info
        .mappings()
        .iter()
        .map(|(value, type_ref)| (value.as_str(), type_ref.name.as_str()))
        .collect();
    assert_eq!(mappings, [("circle", "Circle"), ("square", "Square")]);

    let chosen = composed
        .select_member(&model, Some(info), &json!({"type": "square", "side": 2.0}))
        .context("no member selected")?;
    assert_eq!(chosen.name, "Square");
    Ok(())
}

#[tokio::test]
async fn test_union_fallback_prefers_declaration_order() -> Result<()> {
    let document = store_document().await?;
    let (model, _) = build_model(&document)?;

    let label = class_named(&model, MODELS, "Label")?;
    let composed = label.composed_type.as_ref().context("Label is not composed")?;
    let members: Vec<_> = composed.members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(members, ["Circle", "Square", "string"]);

    // Valid for both Circle and Square
    let chosen = composed
        .select_member(&model, label.discriminator.as_ref(), &json!({"type": "round"}))
        .context("no member selected")?;
    assert_eq!(chosen.name, "Circle");

    let chosen = composed
        .select_member(&model, label.discriminator.as_ref(), &json!("plain text"))
        .context("no member selected")?;
    assert_eq!(chosen.name, "string");
    Ok(())
}

#[tokio::test]
async fn test_all_of_merges_identical_property() -> Result<()> {
    let document = store_document().await?;
    let (model, diagnostics) = build_model(&document)?;
    assert!(!diagnostics.has_errors());

    let derived = class_named(&model, MODELS, "Derived")?;
    let base = derived.base.as_ref().context("Derived has no base")?;
    assert_eq!(base.name, "Base");
    let xs: Vec<_> = derived.properties().iter().filter(|p| p.name == "x").collect();
    assert_eq!(xs.len(), 1);
    assert!(xs[0].exists_in_base_type);

    let outputs = render_all(&document, &all_languages_config()).await?;
    let csharp = outputs
        .iter()
        .find(|o| o.language == GenerationLanguage::CSharp)
        .context("no C# output")?;
    assert!(file(csharp, "Models/Derived.cs")?.contains("public partial class Derived : Base"));
    Ok(())
}

#[tokio::test]
async fn test_users_item_builder() -> Result<()> {
    let document = store_document().await?;
    let (model, _) = build_model(&document)?;

    let users = class_named(&model, "ApiSdk.users", "UsersRequestBuilder")?;
    assert_eq!(users.indexers().len(), 1);
    assert_eq!(users.indexers()[0].index_parameter_name, "id");

    let item = class_named(&model, "ApiSdk.users.item", "WithIdItemRequestBuilder")?;
    let executors: Vec<_> = item
        .methods()
        .iter()
        .filter(|m| m.kind == MethodKind::RequestExecutor)
        .filter_map(|m| m.http_method)
        .map(|m| m.pascal_name())
        .collect();
    assert_eq!(executors, ["Get", "Patch"]);
    let generators = item
        .methods()
        .iter()
        .filter(|m| m.kind == MethodKind::RequestGenerator)
        .count();
    assert_eq!(generators, 2);

    let outputs = render_all(&document, &all_languages_config()).await?;
    for output in &outputs {
        let (path, expected): (&str, &[&str]) = match output.language {
            GenerationLanguage::CSharp => (
                "Users/Item/WithIdItemRequestBuilder.cs",
                &["GetAsync(", "PatchAsync(", "ToGetRequestInformation(", "ToPatchRequestInformation("],
            ),
            GenerationLanguage::Java => (
                "users/item/WithIdItemRequestBuilder.java",
                &["public User get(", "public void patch(", "toPatchRequestInformation("],
            ),
            GenerationLanguage::TypeScript => (
                "users/item/withIdItemRequestBuilder.ts",
                &["public async get(", "public async patch(", "toPatchRequestInformation("],
            ),
            GenerationLanguage::Python => (
                "users/item/with_id_item_request_builder.py",
                &["async def get(self", "async def patch(self", "def to_patch_request_information("],
            ),
        };
        let text = file(output, path)?;
        for snippet in expected {
            assert!(text.contains(snippet), "{} {} lacks {}", output.language, path, snippet);
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_schema_named_like_namespace_file() -> Result<()> {
    let document = store_document().await?;
    let outputs = render_all(&document, &all_languages_config()).await?;
    let typescript = outputs
        .iter()
        .find(|o| o.language == GenerationLanguage::TypeScript)
        .context("no TypeScript output")?;
    assert!(file(typescript, "models/indexEscaped.ts")?.contains("Index"));
    assert!(file(typescript, "models/index.ts")?.contains("export * from './indexEscaped';"));

    let python = outputs
        .iter()
        .find(|o| o.language == GenerationLanguage::Python)
        .context("no Python output")?;
    assert!(file(python, "models/index.py")?.contains("class Index"));
    Ok(())
}
