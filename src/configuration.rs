use std::path::PathBuf;

pub trait Configuration: Clone + Send + Sync + 'static {
    fn port(&self) -> String;
    fn database_url(&self) -> Option<String>;
    fn calendar_credentials(&self) -> Option<PathBuf>;
    fn calendar_id(&self) -> String;
}
