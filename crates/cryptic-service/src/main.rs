use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use cryptic_service::{
    HandlerResult, Invocation, RegistryBuilder, RegistryError, StructuredHealthReporter,
    SystemConfigLoader, bootstrap_with,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> ExitCode {
    let bootstrapped = match bootstrap_with(
        &SystemConfigLoader,
        Arc::new(StructuredHealthReporter::new()),
    ) {
        Ok(bootstrapped) => bootstrapped,
        Err(error) => return report(&error),
    };

    let registry = match template_registry() {
        Ok(registry) => registry,
        Err(error) => return report(&error),
    };

    let service = bootstrapped.into_service(registry.build());
    service
        .run_until(async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                tracing::error!(%error, "failed to listen for ctrl-c");
            }
        })
        .await;
    ExitCode::SUCCESS
}

fn template_registry() -> Result<RegistryBuilder, RegistryError> {
    let mut registry = RegistryBuilder::new();
    registry.register_user_endpoint(["template"], &[], &[], echo)?;
    Ok(registry)
}

async fn echo(invocation: Invocation<Uuid>) -> HandlerResult {
    Ok(invocation.into_parts().0)
}

fn report(error: &dyn std::error::Error) -> ExitCode {
    let mut stderr = io::stderr().lock();
    drop(writeln!(stderr, "cryptic-service: {error}"));
    ExitCode::FAILURE
}
