use std::sync::Arc;

use anyhow::{Error, Result};
use campaign_ingest::{api::run_api_server, clients::rbmq::RabbitMqClient, config::Config, logging};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::load()?;
    logging::init(config.log_json);

    let publisher = RabbitMqClient::connect(&config).await?;

    run_api_server(config, Arc::new(publisher)).await
}
