use opifex::app::{run_app, MockApp};
use opifex::utils::logger;
use std::process::ExitCode;

fn main() -> ExitCode {
    logger::init_quiet_logger();

    run_app::<MockApp>(&mut std::io::stderr().lock()).exit_code()
}
