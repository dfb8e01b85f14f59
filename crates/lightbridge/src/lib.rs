pub mod config;
pub mod dispatch;
pub mod mqtt;

pub use config::Config;
pub use config::ConfigError;
pub use config::LogLevel;
pub use dispatch::DispatchError;
pub use dispatch::Dispatcher;
pub use dispatch::MappingTable;
