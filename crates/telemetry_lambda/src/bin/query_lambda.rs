use chrono::Utc;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use telemetry_lambda::adapters::dynamodb::DynamoReadingStore;
use telemetry_lambda::config::HandlerConfig;
use telemetry_lambda::handlers::query::{handle_query_event, ApiGatewayResponse, QueryContext};
use telemetry_lambda::observability::init_logging;

async fn handle_request(
    event: LambdaEvent<Value>,
    config: &HandlerConfig,
    store: &DynamoReadingStore,
) -> Result<ApiGatewayResponse, Error> {
    let context = QueryContext::from_config(config, Utc::now().timestamp_millis());
    Ok(handle_query_event(event.payload, &context, store))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = HandlerConfig::from_env()
        .map_err(|error| Error::from(format!("invalid configuration: {error}")))?;
    init_logging(&config.log_level);

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = DynamoReadingStore::new(
        aws_sdk_dynamodb::Client::new(&aws_config),
        config.table_name.clone(),
    );

    let config = &config;
    let store = &store;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, config, store).await
    }))
    .await
}
