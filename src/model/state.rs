/// Marker for a model that is **not yet trained**.
///
/// Only [`Trainer::fit`](crate::trainer::Trainer::fit) and the solvers accept
/// an `Unfitted` model; probability and label prediction are unavailable
/// until the model becomes `Fitted`.
#[derive(Clone, Copy, Debug)]
pub struct Unfitted;

/// Marker for a fully trained model.
///
/// A `Fitted` model holds only inference parameters: no solver state, loss
/// function or training data. It implements
/// [`InferenceModel`](crate::model::InferenceModel) and can be serialized.
#[derive(Clone, Copy, Debug)]
pub struct Fitted;
