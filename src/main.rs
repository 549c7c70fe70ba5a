use std::sync::Arc;

use sqlx::any::AnyPoolOptions;
use tracing_subscriber::EnvFilter;

use task_api::middleware::{
	AccessLogMiddleware, CorsMiddleware, RecoveryMiddleware, RequestIdMiddleware,
};
use task_api::{
	ApiRouter, HttpServer, Settings, SqlTaskRepository, TaskHandlers, TaskService,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
		.init();

	let settings = Settings::from_env()?;

	sqlx::any::install_default_drivers();
	let pool = Arc::new(
		AnyPoolOptions::new()
			.max_connections(settings.db_max_connections)
			.connect(&settings.database_url)
			.await?,
	);

	let repository = Arc::new(SqlTaskRepository::new(pool));
	repository.create_table().await?;

	let service = Arc::new(TaskService::new(repository));
	let router = Arc::new(ApiRouter::new(TaskHandlers::new(service)));

	let server = HttpServer::new(router)
		.with_middleware(Arc::new(RecoveryMiddleware::new()))
		.with_middleware(Arc::new(RequestIdMiddleware::new()))
		.with_middleware(Arc::new(AccessLogMiddleware::new()))
		.with_middleware(Arc::new(CorsMiddleware::permissive()));

	tokio::select! {
		result = server.listen(settings.server_addr) => {
			result?;
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("shutdown signal received");
		}
	}

	Ok(())
}
