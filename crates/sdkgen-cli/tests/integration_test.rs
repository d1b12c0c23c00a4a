//! End-to-end integration tests for the sdkgen CLI

mod test_utils;

use anyhow::Result;
use test_utils::{create_temp_dir, create_test_openapi_spec, run_sdkgen};

#[test]
fn test_generate_single_language() -> Result<()> {
    let (_temp_dir, dir) = create_temp_dir()?;
    create_test_openapi_spec(&dir)?;

    let output = run_sdkgen(&dir, &["generate", "-d", "openapi.yaml", "-o", "out", "-l", "csharp"])?;

    assert!(
        output.status.success(),
        "generate failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(dir.join("out/ApiClient.cs").exists());
    assert!(dir.join("out/Pets/PetsRequestBuilder.cs").exists());
    assert!(dir.join("out/Pets/Item/WithPetItemRequestBuilder.cs").exists());
    assert!(dir.join("out/Models/Pet.cs").exists());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("GetWithBody"), "missing warning in: {}", stderr);
    Ok(())
}

#[test]
fn test_generate_several_languages() -> Result<()> {
    let (_temp_dir, dir) = create_temp_dir()?;
    create_test_openapi_spec(&dir)?;

    let output = run_sdkgen(
        &dir,
        &[
            "generate",
            "--openapi",
            "openapi.yaml",
            "--output",
            "sdk",
            "--language",
            "java,typescript,python",
            "--class-name",
            "PetsClient",
            "--disable-validation-rules",
            "all",
        ],
    )?;

    assert!(output.status.success());
    assert!(dir.join("sdk/java/PetsClient.java").exists());
    assert!(dir.join("sdk/typescript/petsClient.ts").exists());
    assert!(dir.join("sdk/python/pets_client.py").exists());
    assert!(!dir.join("sdk/csharp").exists());
    assert!(!String::from_utf8_lossy(&output.stderr).contains("GetWithBody"));
    Ok(())
}

#[test]
fn test_generate_discovers_config_file() -> Result<()> {
    let (_temp_dir, dir) = create_temp_dir()?;
    create_test_openapi_spec(&dir)?;
    std::fs::write(
        dir.join("sdkgen.yaml"),
        "openapi_path: openapi.yaml\noutput_path: from-config\nlanguages: [python]\nclient_namespace_name: petstore\n",
    )?;

    let output = run_sdkgen(&dir, &["generate"])?;

    assert!(
        output.status.success(),
        "generate failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(dir.join("from-config/api_client.py").exists());
    assert!(dir.join("from-config/models/pet.py").exists());
    Ok(())
}

#[test]
fn test_generate_requires_a_description() -> Result<()> {
    let (_temp_dir, dir) = create_temp_dir()?;

    let output = run_sdkgen(&dir, &["generate", "-o", "out"])?;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No OpenAPI description"));
    Ok(())
}

#[test]
fn test_show_prints_url_tree() -> Result<()> {
    let (_temp_dir, dir) = create_temp_dir()?;
    create_test_openapi_spec(&dir)?;

    let output = run_sdkgen(&dir, &["show", "-d", "openapi.yaml"])?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("/\n"));
    assert!(stdout.contains("pets (GET, POST)"));
    assert!(stdout.contains("{petId} (GET)"));
    Ok(())
}

#[test]
fn test_validate_reports_warnings_as_json() -> Result<()> {
    let (_temp_dir, dir) = create_temp_dir()?;
    create_test_openapi_spec(&dir)?;

    let output = run_sdkgen(&dir, &["validate", "-d", "openapi.yaml", "--json"])?;
    assert!(output.status.success());
    let warnings: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let codes: Vec<_> = warnings
        .as_array()
        .map(|items| items.iter().filter_map(|w| w["code"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(codes, ["GetWithBody"]);

    let output = run_sdkgen(
        &dir,
        &["validate", "-d", "openapi.yaml", "--disable-validation-rules", "GetWithBody"],
    )?;
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    Ok(())
}

#[test]
fn test_validate_rejects_unknown_rule() -> Result<()> {
    let (_temp_dir, dir) = create_temp_dir()?;
    create_test_openapi_spec(&dir)?;

    let output = run_sdkgen(
        &dir,
        &["validate", "-d", "openapi.yaml", "--disable-validation-rules", "NotARule"],
    )?;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("NotARule"));
    Ok(())
}
