use serde_json::Value;
use telemetry_core::actuation::{plan_actuation, TelemetryEvent};
use telemetry_core::contract::{ActuationSummary, ValidationError};
use thiserror::Error;
use tracing::{info, warn};

use crate::adapters::alert_notifier::AlertNotifier;
use crate::adapters::command_publisher::CommandPublisher;

#[derive(Debug, Error)]
pub enum ActuationError {
    #[error("invalid telemetry event: {0}")]
    Validation(#[from] ValidationError),
    #[error("failed to encode led command: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{0}")]
    Publish(String),
    #[error("{0}")]
    Notify(String),
}

/// Publishes the LED command, then the alert when the reading is too hot.
///
/// Nothing is rolled back: if the alert fails after the command went out the
/// error still surfaces to the caller.
pub fn handle_actuation_event(
    event: &Value,
    publisher: &dyn CommandPublisher,
    notifier: &dyn AlertNotifier,
) -> Result<ActuationSummary, ActuationError> {
    info!(event = %event, "received telemetry event");

    let telemetry = TelemetryEvent::from_value(event)?;
    let plan = plan_actuation(&telemetry);

    let payload = serde_json::to_vec(&plan.command)?;
    publisher
        .publish_command(&plan.topic, &payload)
        .map_err(ActuationError::Publish)?;
    info!(
        topic = %plan.topic,
        led = plan.command.led.as_str(),
        "published led command"
    );

    if let Some(alert) = &plan.alert {
        notifier
            .notify(&alert.subject, &alert.message)
            .map_err(ActuationError::Notify)?;
        warn!(
            device_id = %telemetry.device_id,
            temp = telemetry.temp,
            "temperature alert sent"
        );
    }

    Ok(ActuationSummary {
        status: "OK".to_string(),
        sns_sent: plan.alert.is_some(),
        led_state_sent: plan.command,
    })
}
