pub trait AlertNotifier {
    fn notify(&self, subject: &str, message: &str) -> Result<(), String>;
}
