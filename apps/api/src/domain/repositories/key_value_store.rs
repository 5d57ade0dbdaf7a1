/// Durable string key-value storage shared by every local consumer
///
/// Values are JSON-encoded text under fixed key names.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, String>;

    fn set(&self, key: &str, value: &str) -> Result<(), String>;

    fn remove(&self, key: &str) -> Result<(), String>;

    /// Push pending writes to durable storage
    fn flush(&self) -> Result<(), String>;
}
