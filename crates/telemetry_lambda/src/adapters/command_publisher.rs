/// Best-effort (qos 0) publish to a device topic.
pub trait CommandPublisher {
    fn publish_command(&self, topic: &str, payload: &[u8]) -> Result<(), String>;
}
