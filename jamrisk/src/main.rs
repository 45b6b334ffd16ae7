use clap::Parser;
use jamrisk::app::{JamRiskApp, JamRiskAppError};

fn main() -> Result<(), JamRiskAppError> {
    env_logger::init();
    let args = JamRiskApp::parse();
    args.op.run()
}
