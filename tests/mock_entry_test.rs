use std::process::{Command, Output};

fn run_mock(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mock"))
        .args(args)
        .output()
        .expect("failed to spawn mock binary")
}

#[test]
fn test_mock_completes_with_clean_error_stream() {
    let output = run_mock(&[]);

    assert!(output.status.success());
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stderr.is_empty());
}

#[test]
fn test_arguments_never_change_the_outcome() {
    let baseline = run_mock(&[]);
    let argument_sets: [&[&str]; 4] = [
        &["--help"],
        &["run", "--fail", "boom"],
        &["", " ", "-", "--"],
        &["\u{1F4A5}", "multi\nline"],
    ];

    for args in argument_sets {
        let output = run_mock(args);
        assert_eq!(output.status.code(), baseline.status.code(), "args: {:?}", args);
        assert_eq!(output.stderr, baseline.stderr, "args: {:?}", args);
    }
}
