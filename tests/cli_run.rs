use std::error::Error;

use clap::Parser;

use buildpipe::cli::{CliArgs, Command};
use buildpipe::orchestrator::StepGraph;
use buildpipe::{dry_run_report, project_root, run};
use buildpipe_test_utils::{init_tracing, with_timeout, ProjectFixture};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn config_in_subdirectory_roots_the_project_there() -> TestResult {
    init_tracing();
    let project = ProjectFixture::new();
    project.write("sub/Buildpipe.toml", "[layout]\ndist = \"out\"\n");

    let root = project_root(Some(project.path("sub/Buildpipe.toml").as_path()))?;

    assert_eq!(root, project.path("sub"));
    Ok(())
}

#[test]
fn bare_config_name_roots_at_working_directory() -> TestResult {
    init_tracing();
    let root = project_root(Some(std::path::Path::new("Buildpipe.toml")))?;
    assert_eq!(root, std::env::current_dir()?.canonicalize()?);
    Ok(())
}

#[test]
fn dry_run_report_lists_the_step_plan() -> TestResult {
    init_tracing();
    let project = ProjectFixture::new();
    let pipeline = project.pipeline();

    let steps = StepGraph::standard().plan(Command::Build)?;
    let report = dry_run_report(&pipeline, Command::Build, &steps);

    assert!(report.starts_with("buildpipe dry-run\n"));
    assert!(report.contains("  project = my-app v1.0.0\n"));
    assert!(report.contains("  toolchain   = builtin\n"), "{report}");
    assert!(report.ends_with("command Build: clean -> ensure-entry -> compile\n"), "{report}");
    Ok(())
}

#[tokio::test]
async fn dry_run_with_subdirectory_config_executes_nothing() -> TestResult {
    init_tracing();
    let project = ProjectFixture::new();
    project
        .write("sub/Buildpipe.toml", "[layout]\ndist = \"out\"\n")
        .write("sub/package.json", buildpipe_test_utils::fixture::PACKAGE_JSON)
        .write("sub/out/stale.js", "old");

    let config = project.path("sub/Buildpipe.toml");
    let args = CliArgs::try_parse_from([
        "buildpipe",
        "--config",
        config.to_str().ok_or("non-utf8 temp path")?,
        "--dry-run",
        "build",
    ])?;
    with_timeout(run(args)).await?;

    assert!(project.exists("sub/out/stale.js"));
    assert!(!project.exists("sub/src/index.js"));
    Ok(())
}
