use crate::app::App;

/// Application run by the `mock` binary. Completes without doing anything;
/// it exists so the entry point can be built and exercised on its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockApp;

impl App for MockApp {
    type Error = anyhow::Error;

    fn run(&mut self) -> anyhow::Result<()> {
        tracing::debug!("mock app running");
        Ok(())
    }
}
