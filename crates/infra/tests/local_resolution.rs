//! End-to-end resolution over the resolution fixture written to disk.

use sourceset_config::{ENV_SOURCE_ROOTS, ResolverConfig};
use sourceset_domain::ProjectPath;
use sourceset_infra::{
    ENV_LOG_LEVEL, ENV_TELEMETRY, InfraResult, LocalRun, Observability, RequestKind,
    SourceFilesReport, build_source_files_deps, run_request_json_local,
};
use sourceset_shared::{ErrorCode, ErrorEnvelope, RequestContext};
use sourceset_testkit::{ProjectFixture, resolution_project};
use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

type TestResult = Result<(), Box<dyn Error>>;

fn temp_dir(label: &str) -> std::io::Result<PathBuf> {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("sourceset-infra-{label}-{unique}"));
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn project_on_disk(label: &str) -> Result<(ProjectFixture, PathBuf), Box<dyn Error>> {
    let project = resolution_project()?;
    let root = temp_dir(label)?;
    project.write_to(&root)?;
    Ok((project, root))
}

fn quiet_env(roots: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (ENV_SOURCE_ROOTS.to_owned(), roots.to_owned()),
        (ENV_LOG_LEVEL.to_owned(), "error".to_owned()),
        (ENV_TELEMETRY.to_owned(), "off".to_owned()),
    ])
}

fn run(
    root: &Path,
    roots: &str,
    kind: RequestKind,
    input_json: &str,
) -> InfraResult<SourceFilesReport> {
    let env = quiet_env(roots);
    let run = LocalRun {
        project_root: root,
        env: &env,
        config_path: None,
        overrides_json: None,
        correlation_id: None,
    };
    run_request_json_local(run, kind, input_json)
}

#[tokio::test]
async fn glob_hydration_matches_fixture_ownership() -> TestResult {
    let (project, root) = project_on_disk("hydrate")?;
    let mut config = ResolverConfig::default();
    config.source_roots.roots.clone_from(&project.source_roots);
    let config = config.validate_and_normalize().map_err(ErrorEnvelope::from)?;
    let deps = build_source_files_deps(&config, &root, &Observability::default())?;
    let ctx = RequestContext::new_request();

    for target in &project.targets {
        let snapshot = deps.hydrator.hydrate(&ctx, target.descriptor()).await?;
        let expected: Vec<String> = target.owned.iter().map(ToString::to_string).collect();
        assert_eq!(snapshot.files(), expected, "ownership of {}", target.address);
    }
    Ok(())
}

#[test]
fn all_request_strips_each_descriptor_by_its_own_root() -> TestResult {
    let (_project, root) = project_on_disk("all")?;
    let report = run(
        &root,
        "src/python,tests/python",
        RequestKind::AllSourceFiles,
        r#"{
          "sources": [
            { "address": "tests/python:tests", "sources": ["t1.py"] },
            { "address": "src/python:python", "sources": ["s1.py", "s2.py"] }
          ],
          "stripSourceRoots": true
        }"#,
    )?;

    assert_eq!(report.files, vec!["s1.py", "s2.py", "t1.py"]);
    assert!(report.collisions.is_empty());
    Ok(())
}

#[test]
fn wildcard_roots_apply_to_every_matching_directory() -> TestResult {
    let (_project, root) = project_on_disk("wildcard")?;
    let report = run(
        &root,
        "src/*",
        RequestKind::AllSourceFiles,
        r#"{
          "sources": [
            { "address": "src/java:java", "sources": ["**/*.java"] },
            { "address": "src/python:python", "sources": ["s1.py", "s2.py"] }
          ],
          "stripSourceRoots": true
        }"#,
    )?;

    assert_eq!(report.files, vec!["org/App.java", "s1.py", "s2.py"]);
    Ok(())
}

#[test]
fn specified_request_restricts_filesystem_intents() -> TestResult {
    let (_project, root) = project_on_disk("specified")?;
    let report = run(
        &root,
        "src/python",
        RequestKind::SpecifiedSourceFiles,
        r#"{
          "sourcesWithOrigins": [
            {
              "sources": { "address": "a:a", "sources": ["*.py"] },
              "origin": { "type": "filesystemLiteral", "file": "a/x.py" }
            },
            {
              "sources": { "address": "c:j", "sources": ["j*.java", "!*.tmp.java"] },
              "origin": {
                "type": "filesystemResolvedGlob",
                "glob": "c/*.java",
                "files": ["c/j1.java", "c/m.java"]
              }
            },
            {
              "sources": { "address": "b:b", "sources": ["p.py", "q.java"] },
              "origin": { "type": "siblingAddresses", "directory": "b" }
            }
          ]
        }"#,
    )?;

    assert_eq!(report.files, vec!["a/x.py", "b/p.py", "b/q.java", "c/j1.java"]);
    Ok(())
}

#[test]
fn legacy_request_matches_the_descriptor_request() -> TestResult {
    let (_project, root) = project_on_disk("legacy")?;
    let legacy = run(
        &root,
        "src/python",
        RequestKind::LegacyAllSourceFiles,
        r#"{
          "targets": [
            { "address": "src/python:python", "files": ["src/python/s1.py", "src/python/s2.py"] },
            {
              "address": "src/python:files",
              "typeAlias": "files",
              "files": ["src/python/s1.py", "src/python/s2.py"]
            }
          ],
          "stripSourceRoots": true
        }"#,
    )?;
    let modern = run(
        &root,
        "src/python",
        RequestKind::AllSourceFiles,
        r#"{
          "sources": [
            { "address": "src/python:python", "sources": ["s1.py", "s2.py"] },
            { "address": "src/python:files", "sources": ["s1.py", "s2.py"], "kind": "rawFiles" }
          ],
          "stripSourceRoots": true
        }"#,
    )?;

    assert_eq!(
        legacy.files,
        vec!["s1.py", "s2.py", "src/python/s1.py", "src/python/s2.py"]
    );
    assert_eq!(legacy, modern);
    Ok(())
}

#[test]
fn stripped_collisions_are_reported() -> TestResult {
    let (_project, root) = project_on_disk("collision")?;
    let report = run(
        &root,
        "src/python,tests/python",
        RequestKind::AllSourceFiles,
        r#"{
          "sources": [
            { "address": "src/python:pkg", "sources": ["pkg/util.py"] },
            { "address": "tests/python:pkg", "sources": ["pkg/util.py"] }
          ],
          "stripSourceRoots": true
        }"#,
    )?;

    assert_eq!(report.files, vec!["pkg/util.py"]);
    assert_eq!(report.collisions.len(), 1);
    let collision = report.collisions.first().ok_or("missing collision")?;
    assert_eq!(collision.path, ProjectPath::parse("pkg/util.py")?);
    assert_eq!(collision.digests.len(), 2);
    Ok(())
}

#[test]
fn declared_but_missing_sources_fail_with_not_found() -> TestResult {
    let (_project, root) = project_on_disk("missing")?;
    let result = run(
        &root,
        "src/python",
        RequestKind::AllSourceFiles,
        r#"{ "sources": [{ "address": "b:b", "sources": ["p.py", "gone.java"] }] }"#,
    );

    let error = result.err().ok_or("expected not_found")?;
    assert_eq!(error.code, ErrorCode::not_found());
    assert_eq!(
        error.metadata.get("path").map(String::as_str),
        Some("b/gone.java")
    );
    Ok(())
}

#[test]
fn legacy_capture_failures_name_the_target() -> TestResult {
    let (_project, root) = project_on_disk("legacy-missing")?;
    let result = run(
        &root,
        "src/python",
        RequestKind::LegacyAllSourceFiles,
        r#"{ "targets": [{ "address": "a:a", "files": ["a/x.py", "a/ghost.py"] }] }"#,
    );

    let error = result.err().ok_or("expected not_found")?;
    assert_eq!(error.code, ErrorCode::not_found());
    assert_eq!(error.metadata.get("address").map(String::as_str), Some("a:a"));
    assert_eq!(
        error.metadata.get("path").map(String::as_str),
        Some("a/ghost.py")
    );
    Ok(())
}

#[test]
fn invalid_request_json_fails_before_any_io() {
    let result = run(
        &std::env::temp_dir().join("sourceset-infra-never-created"),
        "src/python",
        RequestKind::SpecifiedSourceFiles,
        r#"{ "sourcesWithOrigins": "nope" }"#,
    );
    assert!(matches!(
        result,
        Err(error) if error.code == ErrorCode::new("config", "invalid_json")
    ));
}

#[test]
fn blank_correlation_ids_are_rejected() -> TestResult {
    let (_project, root) = project_on_disk("correlation")?;
    let env = quiet_env("src/python");
    let run = LocalRun {
        project_root: &root,
        env: &env,
        config_path: None,
        overrides_json: Some(r#"{"core":{"maxConcurrency":2}}"#),
        correlation_id: Some("  "),
    };
    let result = run_request_json_local(run, RequestKind::AllSourceFiles, r#"{"sources":[]}"#);
    assert!(matches!(
        result,
        Err(error) if error.code == ErrorCode::invalid_input()
    ));

    let run = LocalRun {
        correlation_id: Some("build-42"),
        ..run
    };
    let report = run_request_json_local(run, RequestKind::AllSourceFiles, r#"{"sources":[]}"#)?;
    assert!(report.files.is_empty());
    Ok(())
}
