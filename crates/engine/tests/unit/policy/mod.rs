/// Learned policy and scorers.
pub mod learned;
/// Reflex policies.
pub mod reflex;
