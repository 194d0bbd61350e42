pub mod alert_notifier;
pub mod command_publisher;
pub mod dynamodb;
pub mod reading_store;
