pub mod annotate;
pub mod classifier;
pub mod config;
pub mod detection;
pub mod error;
pub mod pipeline;
pub mod shapes;
pub mod source;

pub use classifier::{Classifier, SearchParams};
pub use config::{DetectorConfig, Preset};
pub use detection::FaceDetection;
pub use error::{DetectionError, ErrorEnvelope};
pub use pipeline::Pipeline;
pub use pipeline::cascade::CascadeClassifier;
