pub trait EventPublisher {
    fn put_event(&self, detail_type: &str, detail: &str) -> Result<(), String>;
}
