use aws_sdk_iotdataplane::primitives::Blob;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use telemetry_core::contract::ActuationSummary;
use telemetry_lambda::adapters::alert_notifier::AlertNotifier;
use telemetry_lambda::adapters::command_publisher::CommandPublisher;
use telemetry_lambda::config::HandlerConfig;
use telemetry_lambda::handlers::actuation::handle_actuation_event;
use telemetry_lambda::observability::init_logging;

struct IotCommandPublisher {
    iot_client: aws_sdk_iotdataplane::Client,
}

impl CommandPublisher for IotCommandPublisher {
    fn publish_command(&self, topic: &str, payload: &[u8]) -> Result<(), String> {
        let client = self.iot_client.clone();
        let topic = topic.to_string();
        let body = payload.to_vec();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .publish()
                    .topic(topic)
                    .qos(0)
                    .payload(Blob::new(body))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("failed to publish led command: {error}"))
            })
        })
    }
}

struct SnsAlertNotifier {
    sns_client: aws_sdk_sns::Client,
    topic_arn: String,
}

impl AlertNotifier for SnsAlertNotifier {
    fn notify(&self, subject: &str, message: &str) -> Result<(), String> {
        let client = self.sns_client.clone();
        let topic_arn = self.topic_arn.clone();
        let subject = subject.to_string();
        let message = message.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .publish()
                    .topic_arn(topic_arn)
                    .subject(subject)
                    .message(message)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("failed to publish temperature alert: {error}"))
            })
        })
    }
}

struct RuntimeDependencies {
    publisher: IotCommandPublisher,
    notifier: SnsAlertNotifier,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<ActuationSummary, Error> {
    handle_actuation_event(&event.payload, &deps.publisher, &deps.notifier)
        .map_err(|error| Error::from(error.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = HandlerConfig::from_env()
        .map_err(|error| Error::from(format!("invalid configuration: {error}")))?;
    init_logging(&config.log_level);
    let topic_arn = config
        .require_alert_topic_arn()
        .map_err(|error| Error::from(error.to_string()))?
        .to_string();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let mut iot_config = aws_sdk_iotdataplane::config::Builder::from(&aws_config);
    if let Some(endpoint) = config.iot_endpoint.as_deref() {
        iot_config = iot_config.endpoint_url(endpoint);
    }

    let deps = RuntimeDependencies {
        publisher: IotCommandPublisher {
            iot_client: aws_sdk_iotdataplane::Client::from_conf(iot_config.build()),
        },
        notifier: SnsAlertNotifier {
            sns_client: aws_sdk_sns::Client::new(&aws_config),
            topic_arn,
        },
    };

    let deps = &deps;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, deps).await
    }))
    .await
}
