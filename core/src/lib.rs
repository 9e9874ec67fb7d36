//! Numeric kernels for a feed-forward mention-ranking coreference model.
//!
//! Three groups of routines operate on caller-owned flat `f64` buffers:
//! sparse proximal AdaGrad for embedding-style weight matrices, the sparse
//! first hidden layer over mention pairs, and latent-antecedent selection
//! with a cost-augmented margin loss. Nothing here owns model state. Every
//! kernel validates its inputs before writing and reports problems through
//! [`KernelError`].

pub mod error;
pub mod config;
pub mod layout;
pub mod dispatch;
pub mod tensor;
pub mod adagrad;
pub mod pair_features;
pub mod antecedent;
pub mod margin;

pub use error::{KernelError, Result};
pub use config::{AdaGradConfig, EngineConfig, MarginCosts};
pub use layout::{Dims, Layout, NonzeroSet, SparseKind};
pub use adagrad::{accumulate_variance, adagrad_step, SparseAdaGrad};
pub use pair_features::{accumulate_pair_embeddings, build_hidden_layer, EmbeddingTable, RaggedFeatures};
pub use antecedent::{select_best_gold_antecedent, GoldAntecedents};
pub use margin::{find_margin_violation, mention_hinge_loss, pairwise_cost, MentionLoss};
