//! Failure paths: every error aborts the run with enough context to find
//! the offending node.

mod common;

use scenepipe::{Error, Pipeline, Placeholders, RunOptions};

use common::recording_pipeline;

fn run(doc: &str, args: &[&str]) -> scenepipe::Result<scenepipe::RunReport> {
    Pipeline::new().run_str(doc, args, Some(1))
}

#[test]
fn test_parse_error_reports_position() {
    let err = run("{'version': 3,\n  'modules': [,]}", &[]).unwrap_err();
    match err {
        Error::ParseError { line, column, .. } => assert_eq!((line, column), (2, 15)),
        other => panic!("expected ParseError, got {other:?}"),
    }
}

#[test]
fn test_unquoted_value_rejected() {
    let err = run("{'version': 3, 'modules': [{'module': loader.EntityLoader}]}", &[]);
    assert!(matches!(err, Err(Error::ParseError { .. })));
}

#[test]
fn test_missing_arg_fails_before_any_module() {
    let (pipeline, recorder) = recording_pipeline();
    let err = pipeline
        .run_str(
            "{'version': 3, 'modules': [{'module': 'test.Record'},
              {'module': 'test.Record', 'config': {'path': '<args:2>'}}]}",
            &["only-one"],
            Some(1),
        )
        .unwrap_err();
    match err {
        Error::PlaceholderError { path, .. } => assert_eq!(path, "modules[1].config.path"),
        other => panic!("expected PlaceholderError, got {other:?}"),
    }
    assert!(recorder.calls().is_empty());
}

#[test]
fn test_undefined_env_var_is_error() {
    let err = Pipeline::new().run_document(
        "{'version': 3, 'modules': [{'module': 'test.Record', 'config': {'a': '<env:NOPE_X>'}}]}",
        &Placeholders::default(),
        RunOptions::seeded(1),
    );
    assert!(matches!(err, Err(Error::PlaceholderError { .. })));
}

#[test]
fn test_unknown_module_halts_before_any_module() {
    let (pipeline, recorder) = recording_pipeline();
    let err = pipeline
        .run_str(
            "{'version': 3, 'modules': [{'module': 'test.Record'}, {'module': 'render.Nope'}]}",
            &[],
            Some(1),
        )
        .unwrap_err();
    match err {
        Error::UnknownModule { name, index } => assert_eq!((name.as_str(), index), ("render.Nope", 1)),
        other => panic!("expected UnknownModule, got {other:?}"),
    }
    assert!(recorder.calls().is_empty());
}

#[test]
fn test_unknown_provider_stops_owning_module() {
    let (pipeline, recorder) = recording_pipeline();
    let err = pipeline
        .run_str(
            "{'version': 3, 'modules': [
                {'module': 'test.Record', 'config': {'ok': 1}},
                {'module': 'test.Record', 'config': {'x': [0, {'provider': 'sampler.Typo'}]}},
                {'module': 'test.Record', 'config': {'never': 1}}]}",
            &[],
            Some(1),
        )
        .unwrap_err();

    match &err {
        Error::ModuleError { index, module, source } => {
            assert_eq!(*index, 1);
            assert_eq!(module, "test.Record");
            assert!(matches!(
                source.as_ref(),
                Error::UnknownProvider { name, path }
                    if name == "sampler.Typo" && path == "modules[1].config.x[1]"
            ));
        }
        other => panic!("expected ModuleError, got {other:?}"),
    }
    assert!(err.to_string().contains("sampler.Typo"));
    assert_eq!(recorder.calls().len(), 1);
}

#[test]
fn test_provider_parameter_error_has_path() {
    let err = run(
        "{'version': 3, 'modules': [{'module': 'loader.EntityLoader', 'config': {'entities': [
            {'name': 'A', 'location': {'provider': 'sampler.Uniform3d', 'min': [0, 0], 'max': [1, 1, 1]}}
        ]}}]}",
        &[],
    )
    .unwrap_err();
    let Error::ModuleError { source, .. } = err else { panic!("expected ModuleError") };
    match *source {
        Error::ProviderError { provider, path, .. } => {
            assert_eq!(provider, "sampler.Uniform3d");
            assert_eq!(path, "modules[0].config.entities[0].location");
        }
        other => panic!("expected ProviderError, got {other:?}"),
    }
}

#[test]
fn test_module_failure_is_fatal() {
    let mut pipeline = Pipeline::new();
    pipeline.register_module_fn("test.Fail", |_, _| {
        Err(Error::NotFound("scene asset".into()))
    });
    let err = pipeline
        .run_str(
            "{'version': 3, 'modules': [{'module': 'test.Fail'},
              {'module': 'loader.EntityLoader', 'config': {'entities': [{'name': 'A'}]}}]}",
            &[],
            Some(1),
        )
        .unwrap_err();
    assert!(matches!(err, Error::ModuleError { index: 0, .. }));
}

#[test]
fn test_check_validates_without_running() {
    let (pipeline, recorder) = recording_pipeline();
    let spec = pipeline
        .check(
            "{'version': 3, 'setup': {'pip': ['h5py']}, 'modules': [{'module': 'test.Record'}]}",
            &Placeholders::default(),
        )
        .unwrap();
    assert_eq!(spec.modules.len(), 1);
    assert!(recorder.calls().is_empty());

    let err = pipeline.check(
        "{'version': 3, 'modules': [{'module': 'test.Missing'}]}",
        &Placeholders::default(),
    );
    assert!(matches!(err, Err(Error::UnknownModule { .. })));
}
