//! CLI integration tests: the `--from`/`--to`/`--overwrite` file-I/O
//! contract, exercised against real files via `tempfile`.

use std::fs;

use djotters::cli::{run, Args};

#[test]
fn writes_rendered_html_to_the_requested_path() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("in.djot");
    let output_path = dir.path().join("out.html");
    fs::write(&input_path, "hello *world*!").unwrap();

    let args = Args {
        from: Some(input_path.to_str().unwrap().to_string()),
        to: Some(output_path.to_str().unwrap().to_string()),
        overwrite: false,
    };
    run(args).unwrap();

    let rendered = fs::read_to_string(&output_path).unwrap();
    assert_eq!(rendered, "<p>hello <strong>world</strong>!</p>\n");
}

#[test]
fn refuses_to_overwrite_an_existing_output_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("in.djot");
    let output_path = dir.path().join("out.html");
    fs::write(&input_path, "hello").unwrap();
    fs::write(&output_path, "stale").unwrap();

    let args = Args {
        from: Some(input_path.to_str().unwrap().to_string()),
        to: Some(output_path.to_str().unwrap().to_string()),
        overwrite: false,
    };
    assert!(run(args).is_err());
    assert_eq!(fs::read_to_string(&output_path).unwrap(), "stale");
}

#[test]
fn overwrite_flag_permits_replacing_an_existing_output() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("in.djot");
    let output_path = dir.path().join("out.html");
    fs::write(&input_path, "hello").unwrap();
    fs::write(&output_path, "stale").unwrap();

    let args = Args {
        from: Some(input_path.to_str().unwrap().to_string()),
        to: Some(output_path.to_str().unwrap().to_string()),
        overwrite: true,
    };
    run(args).unwrap();
    assert_eq!(fs::read_to_string(&output_path).unwrap(), "<p>hello</p>\n");
}

#[test]
fn missing_input_file_is_reported_as_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let args = Args { from: Some(dir.path().join("missing.djot").to_str().unwrap().to_string()), to: None, overwrite: false };
    assert!(run(args).is_err());
}
