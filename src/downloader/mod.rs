// Downloader module - acquisition pipeline behind the HTTP shell

pub mod backends;
pub mod classifier;
pub mod credentials;
pub mod errors;
pub mod format_selector;
pub mod lifecycle;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod tools;
pub mod traits;
pub mod utils;

pub use backends::YtDlpBackend;
pub use credentials::CredentialMaterializer;
pub use errors::{BackendError, ClassifiedError, ErrorKind, PipelineFailure};
pub use format_selector::FormatSelector;
pub use lifecycle::OutputGuard;
pub use models::{
    AcquisitionRequest, AcquisitionResult, BackendRequest, CredentialHandle, ExtractedInfo, FormatPlan,
    RequestedDownload, ToolAvailability,
};
pub use orchestrator::{AcquireOptions, Delivery, Downloader};
pub use output::OutputResolver;
pub use tools::ToolLocator;
pub use traits::ExtractionBackend;
pub use utils::sanitize_filename;
