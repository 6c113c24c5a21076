use anyhow::Context;
use cloudvm_api::app::{create_cors, AppState};
use cloudvm_api::routes::create_router;
use cloudvm_api::{ProvisioningService, Settings, VmRepository};
use cloudvm_providers::ProviderFactory;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = Settings::from_env();

    let repository = VmRepository::open(&settings.storage_file, settings.storage_failure_policy)
        .await
        .with_context(|| {
            format!(
                "failed to open VM store at {}",
                settings.storage_file.display()
            )
        })?;
    tracing::info!(
        "VM store: {} (storage failure policy: {:?})",
        settings.storage_file.display(),
        settings.storage_failure_policy
    );

    let factory = Arc::new(ProviderFactory::new());
    let service = ProvisioningService::new(factory, repository);
    let state = AppState::new(Arc::new(service));

    let app = create_router().layer(create_cors()).with_state(state);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;
    tracing::info!("VM provisioning API listening on {}", settings.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
