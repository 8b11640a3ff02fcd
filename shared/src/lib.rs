pub mod config;
pub mod cors;
pub mod status;

use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client as DynamoClient;
use gigboard_atoms::store::{BidStore, DynamoBidStore, DynamoTaskStore, TaskStore};

pub use config::Config;

/// Process-wide handles, built once at cold start and shared by every
/// invocation.
pub struct AppState {
    pub tasks: Arc<dyn TaskStore>,
    pub bids: Arc<dyn BidStore>,
    pub config: Config,
}

impl AppState {
    pub fn new(tasks: Arc<dyn TaskStore>, bids: Arc<dyn BidStore>, config: Config) -> Self {
        Self { tasks, bids, config }
    }

    /// One DynamoDB client for both tables.
    pub async fn from_env() -> Self {
        let config = Config::load();
        let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let dynamo_client = DynamoClient::new(&aws_config);

        tracing::info!(
            "Using tables tasks={} bids={}",
            config.tasks_table,
            config.bids_table
        );

        Self::new(
            Arc::new(DynamoTaskStore::new(dynamo_client.clone(), &config.tasks_table)),
            Arc::new(DynamoBidStore::new(dynamo_client, &config.bids_table)),
            config,
        )
    }
}
