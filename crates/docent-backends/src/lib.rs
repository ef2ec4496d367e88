//! External capabilities consumed by the docent controller.
//!
//! Each upstream service is modelled as a trait with a typed contract, so the
//! controller and tool adapters never see a wire format:
//!
//! ```text
//! ┌──────────────┐  ┌──────────────┐  ┌──────────────┐
//! │  Classifier  │  │ VectorIndex  │  │  Generator   │
//! │  classify()  │  │   query()    │  │  generate()  │
//! └──────┬───────┘  └──────┬───────┘  └──────┬───────┘
//!        ▼                 ▼                 ▼
//!  HttpClassifier    PineconeIndex     OpenAiGenerator
//!                          │
//!                          ▼
//!                    Embedder (OpenAI)
//! ```
//!
//! Mock implementations live behind the `testing` feature.

pub mod classifier;
pub mod embeddings;
pub mod error;
pub mod generation;
pub mod retry;
pub mod vector;

#[cfg(any(test, feature = "testing"))]
pub mod mock;

pub use classifier::{Classification, Classifier, HttpClassifier, HttpClassifierConfig, SharedClassifier};
pub use embeddings::{Embedder, OpenAiEmbedder, OpenAiEmbedderConfig, SharedEmbedder};
pub use error::{BackendError, Result};
pub use generation::{
    ChatTurn, GenerationRequest, Generator, OpenAiGenerator, OpenAiGeneratorConfig,
    SharedGenerator,
};
pub use retry::with_retry;
pub use vector::{PineconeConfig, PineconeIndex, SharedVectorIndex, VectorIndex, VectorMatch};

#[cfg(any(test, feature = "testing"))]
pub use mock::{MockClassifier, MockEmbedder, MockGenerator, MockVectorIndex};
