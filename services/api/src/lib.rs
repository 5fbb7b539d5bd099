mod cli;
mod routes;
mod server;

use complaint_relay::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
