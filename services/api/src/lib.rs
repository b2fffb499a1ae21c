mod cli;
mod demo;
mod infra;
mod report;
mod routes;
mod server;

use sales_analytics::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
