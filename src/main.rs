//! Gateway binary: reads the environment, activates providers, and serves.

// std
use std::process::ExitCode;
// self
use oauth_connector::{config::Env, gateway::GatewayBootstrap, obs};

#[tokio::main]
async fn main() -> ExitCode {
	obs::init_subscriber();

	let env = Env::from_process();
	let gateway = match GatewayBootstrap::new(&env).build() {
		Ok(gateway) => gateway,
		Err(e) => {
			tracing::error!(error = %e, "Gateway failed to start.");

			return ExitCode::FAILURE;
		},
	};

	match gateway.serve().await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			tracing::error!(error = %e, "Gateway stopped with an error.");

			ExitCode::FAILURE
		},
	}
}
