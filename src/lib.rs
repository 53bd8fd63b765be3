pub mod api;
pub mod app_config;
pub mod event_handler;
pub mod host;
pub mod reporter;
pub mod transport;

pub use api::ApiVersion;
pub use host::{BotHost, SerenityHost};
pub use reporter::{LoopExit, ReporterOptions, StatsReporter, UpdateOutcome};
pub use transport::{ApiTransport, ReqwestTransport};
