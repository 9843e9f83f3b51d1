//! Feature preprocessing.
//!
//! Transformers follow a two-state pattern: an unfitted [`Transformer`]
//! learns from data and yields a [`FittedTransformer`], which transforms new
//! data and round-trips through a plain serializable parameter struct.
//!
//! # Available Transformers
//!
//! - [`MedianImputer`]: fill missing numeric cells with the fit-time median
//! - [`StandardScaler`]: z-score normalization, constant columns map to 0
//! - [`OneHotEncoder`]: one-hot categories, unseen values encode as zeros
//! - [`Preprocessor`]: all of the above, driven by a [`FeatureSchema`]
//!
//! # Example
//!
//! ```ignore
//! use churnkit::preprocessing::{FittedTransformer, Preprocessor, Transformer};
//!
//! let fitted = Preprocessor::new(schema).fit(&train)?;
//! let features = fitted.transform(&new_customers)?;
//! ```
//!
//! [`FeatureSchema`]: crate::schema::FeatureSchema

pub mod imputation;
pub mod one_hot;
pub mod preprocessor;
pub mod standard;
pub mod traits;

pub use imputation::{FittedMedianImputer, MedianImputer, MedianImputerParams};
pub use one_hot::{
    CategoricalColumnParams, FittedOneHotEncoder, OneHotEncoder, OneHotEncoderParams,
};
pub use preprocessor::{FittedPreprocessor, NumericColumnParams, Preprocessor, PreprocessorParams};
pub use standard::{FittedStandardScaler, StandardScaler, StandardScalerParams};
pub use traits::{FittedTransformer, Transformer};
