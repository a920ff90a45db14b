use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use scanops_rs::{
    mocks::MockToolRunner, model_build::plan_job, CancelToken, ModelArgs, ModelBuilder,
    ModelOutcome, ScanOpsError,
};

fn args_for(input: &Path) -> ModelArgs {
    ModelArgs {
        input_dir: input.to_path_buf(),
        output: None,
        overwrite: false,
        tool: PathBuf::from("RealityScan.exe"),
        verbose: false,
    }
}

fn make_project(root: &Path, name: &str, images: usize) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    for i in 0..images {
        fs::write(dir.join(format!("shot_{i:03}.jpg")), b"jpeg").unwrap();
    }
    dir
}

#[test]
fn missing_input_directory_is_an_error() {
    let runner = MockToolRunner::new();
    let builder = ModelBuilder::new(args_for(Path::new("/no/such/project")), &runner);
    let err = builder.run(&CancelToken::new()).unwrap_err();

    assert!(matches!(err, ScanOpsError::InputNotFound { .. }));
    assert_eq!(runner.invocation_count(), 0);
}

#[test]
fn build_derives_paths_from_the_project_name() {
    let temp = TempDir::new().unwrap();
    let input = make_project(temp.path(), "ProjectX", 3);

    let runner = MockToolRunner::new();
    let builder = ModelBuilder::new(args_for(&input), &runner);
    let outcome = builder.run(&CancelToken::new()).unwrap();

    assert_eq!(outcome, ModelOutcome::Built);
    assert!(input.join("models").is_dir());
    assert_eq!(runner.invocation_count(), 1);

    let invocation = &runner.invocations()[0];
    let args: Vec<String> = invocation
        .args
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    assert_eq!(args[0], "-headless");
    assert_eq!(args.last().map(String::as_str), Some("-quit"));
    assert!(args
        .iter()
        .any(|a| a.ends_with("models/ProjectX.glb") || a.ends_with(r"models\ProjectX.glb")));
    assert!(args
        .iter()
        .any(|a| a.ends_with("models/ProjectX.rsproj") || a.ends_with(r"models\ProjectX.rsproj")));
}

#[test]
fn directory_without_images_spawns_nothing() {
    let temp = TempDir::new().unwrap();
    let input = make_project(temp.path(), "Empty", 0);

    let runner = MockToolRunner::new();
    let builder = ModelBuilder::new(args_for(&input), &runner);
    let outcome = builder.run(&CancelToken::new()).unwrap();

    assert_eq!(outcome, ModelOutcome::NoImages);
    assert_eq!(runner.invocation_count(), 0);
}

#[test]
fn existing_project_is_skipped_unless_overwriting() {
    let temp = TempDir::new().unwrap();
    let input = make_project(temp.path(), "ProjectX", 2);
    let job = plan_job(&input, None).unwrap();
    fs::create_dir_all(&job.output_dir).unwrap();
    fs::write(&job.project_file, b"existing").unwrap();

    let runner = MockToolRunner::new();
    let builder = ModelBuilder::new(args_for(&input), &runner);
    let outcome = builder.run(&CancelToken::new()).unwrap();
    assert_eq!(outcome, ModelOutcome::SkippedExisting);
    assert_eq!(runner.invocation_count(), 0);

    let mut args = args_for(&input);
    args.overwrite = true;
    let builder = ModelBuilder::new(args, &runner);
    let outcome = builder.run(&CancelToken::new()).unwrap();
    assert_eq!(outcome, ModelOutcome::Built);
    assert_eq!(runner.invocation_count(), 1);
}

#[test]
fn explicit_output_directory_is_used_and_created() {
    let temp = TempDir::new().unwrap();
    let input = make_project(temp.path(), "ProjectX", 1);
    let out = temp.path().join("artifacts");

    let mut args = args_for(&input);
    args.output = Some(out.clone());

    let runner = MockToolRunner::new();
    let builder = ModelBuilder::new(args, &runner);
    let outcome = builder.run(&CancelToken::new()).unwrap();

    assert_eq!(outcome, ModelOutcome::Built);
    assert!(out.is_dir());

    let invocation = &runner.invocations()[0];
    assert!(invocation
        .args
        .iter()
        .any(|a| Path::new(a) == out.join("ProjectX.glb")));
}

#[test]
fn tool_failure_surfaces_the_exit_code() {
    let temp = TempDir::new().unwrap();
    let input = make_project(temp.path(), "ProjectX", 2);
    let job = plan_job(&input, None).unwrap();

    let runner = MockToolRunner::new().with_failure_for(&job.model_file);
    let builder = ModelBuilder::new(args_for(&input), &runner);
    let err = builder.run(&CancelToken::new()).unwrap_err();

    match err {
        ScanOpsError::ToolFailed { code, .. } => assert_eq!(code, 1),
        other => panic!("expected ToolFailed, got {other:?}"),
    }
}
