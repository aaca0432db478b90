// ============ Model implementations ============

pub(crate) mod distilbert;

// Public model structs (for type annotations)
pub use distilbert::{DistilBertReviewModel, MultitaskDistilBert};
