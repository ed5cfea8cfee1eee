pub mod arguments;
pub mod artifacts;
pub mod error;
pub mod network;
pub mod provider;
pub mod runner;
pub mod traits;

use {
    arguments::Arguments,
    artifacts::ArtifactStore,
    clap::{Parser, error::ErrorKind},
    error::Error,
    provider::ArtifactProvider,
    runner::{DeploymentResult, DeploymentRunner, Status},
    std::process::ExitCode,
};

pub async fn start(args: impl Iterator<Item = String>) -> ExitCode {
    let args = match Arguments::try_parse_from(args) {
        Ok(args) => args,
        Err(err) => {
            // Help and version go to stdout, usage errors to stderr.
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => Status::Failure.into(),
            };
        }
    };
    let obs_config = observe::Config::new(
        args.logging.log_filter.as_str(),
        args.logging.use_json_logs,
    );
    observe::tracing::initialize(&obs_config);
    observe::panic_hook::install();
    tracing::info!("running deployer with validated arguments:\n{}", args);

    runner(&args).run(&mut std::io::stdout()).await.into()
}

/// Deploys the configured contract without reporting the outcome.
///
/// Assumes tracing has already been set up.
pub async fn deploy(args: &Arguments) -> Result<DeploymentResult, Error> {
    runner(args).deploy().await
}

fn runner(args: &Arguments) -> DeploymentRunner<ArtifactProvider> {
    let provider = ArtifactProvider::new(
        ArtifactStore::new(&args.artifacts_dir),
        args.network(),
        args.private_key.clone(),
        args.chain_id,
    );
    DeploymentRunner::new(provider, args.contract.as_str())
}
