use opifex::app::{run_app, App, Outcome};
use opifex::OpifexError;

#[derive(Default)]
struct Boom;

impl App for Boom {
    type Error = anyhow::Error;

    fn run(&mut self) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("boom"))
    }
}

#[derive(Default)]
struct NoSources;

impl App for NoSources {
    type Error = OpifexError;

    fn run(&mut self) -> opifex::Result<()> {
        Err(OpifexError::NoSources { stage: "build" })
    }
}

/// Fails with whatever message was queued before construction.
#[derive(Default)]
struct Scripted;

thread_local! {
    static NEXT_MESSAGE: std::cell::RefCell<String> = const { std::cell::RefCell::new(String::new()) };
}

impl App for Scripted {
    type Error = String;

    fn run(&mut self) -> Result<(), String> {
        Err(NEXT_MESSAGE.with(|m| m.borrow().clone()))
    }
}

#[test]
fn test_failure_is_reported_once() {
    let mut err = Vec::new();
    let outcome = run_app::<Boom>(&mut err);

    assert_eq!(err, b"boom\n");
    assert_eq!(outcome, Outcome::Failed("boom".to_string()));
    assert_eq!(outcome.exit_status(), 0);
}

#[test]
fn test_crate_errors_use_their_display_text() {
    let mut err = Vec::new();
    run_app::<NoSources>(&mut err);

    assert_eq!(
        String::from_utf8(err).unwrap(),
        "No source files given for the build stage\n"
    );
}

#[test]
fn test_any_message_gets_exactly_one_trailing_newline() {
    let messages = [
        "",
        "boom",
        "line one\nline two",
        "trailing newline\n",
        "  padded  ",
        "unicode: ünïcødé 💥",
    ];

    for message in messages {
        NEXT_MESSAGE.with(|m| *m.borrow_mut() = message.to_string());
        let mut err = Vec::new();
        let outcome = run_app::<Scripted>(&mut err);

        assert_eq!(String::from_utf8(err).unwrap(), format!("{}\n", message));
        assert_eq!(outcome.exit_status(), 0);
    }
}
