use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind,
    options::{BasicPublishOptions, ConfirmSelectOptions, ExchangeDeclareOptions},
    types::FieldTable,
};
use tracing::{debug, info};

use crate::{clients::publisher::Publisher, config::Config, ingest::CAMPAIGN_EXCHANGE};

const PERSISTENT: u8 = 2;

/// One connection and one channel shared by every request; lapin serializes
/// frames per channel, so concurrent publishes do not interleave.
pub struct RabbitMqClient {
    connection: Connection,
    channel: Channel,
    publisher_confirms: bool,
}

impl RabbitMqClient {
    pub async fn connect(config: &Config) -> Result<Self, Error> {
        info!("Connecting to RabbitMQ...");

        let connection = Connection::connect(&config.rabbitmq_url, ConnectionProperties::default())
            .await
            .map_err(|_| anyhow!("Failed to connect to RabbitMQ"))?;

        info!("RabbitMQ connection established");

        let channel = connection
            .create_channel()
            .await
            .map_err(|_| anyhow!("RabbitMQ channel creation failed"))?;

        if config.publisher_confirms {
            channel
                .confirm_select(ConfirmSelectOptions::default())
                .await
                .map_err(|_| anyhow!("Failed to enable publisher confirms"))?;

            debug!("Publisher confirms enabled");
        }

        channel
            .exchange_declare(
                CAMPAIGN_EXCHANGE,
                ExchangeKind::Direct,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|_| anyhow!("Failed to declare campaign exchange"))?;

        info!(exchange = CAMPAIGN_EXCHANGE, "Campaign exchange declared");

        Ok(Self {
            connection,
            channel,
            publisher_confirms: config.publisher_confirms,
        })
    }
}

#[async_trait]
impl Publisher for RabbitMqClient {
    async fn publish(&self, exchange: &str, routing_key: &str, payload: &[u8]) -> Result<(), Error> {
        let confirm = self
            .channel
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default()
                    .with_content_type("application/json".into())
                    .with_delivery_mode(PERSISTENT),
            )
            .await
            .map_err(|e| anyhow!("Failed to publish message: {}", e))?;

        if self.publisher_confirms {
            let confirmation = confirm
                .await
                .map_err(|e| anyhow!("Failed to receive publisher confirm: {}", e))?;

            if confirmation.is_nack() {
                return Err(anyhow!("Broker rejected message for exchange {}", exchange));
            }
        }

        debug!(exchange, routing_key, bytes = payload.len(), "Message published");

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        if !self.connection.status().connected() {
            return Err(anyhow!("RabbitMQ connection is not open"));
        }

        if !self.channel.status().connected() {
            return Err(anyhow!("RabbitMQ channel is not open"));
        }

        Ok(())
    }
}
