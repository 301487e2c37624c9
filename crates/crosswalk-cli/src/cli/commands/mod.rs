pub mod dispatch;
pub mod evaluation;
pub mod policy;
pub mod policyset;
pub mod posture;

pub use dispatch::dispatch;
