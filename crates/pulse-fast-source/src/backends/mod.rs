pub mod mock;

#[cfg(feature = "backend-nokhwa")]
pub mod nokhwa;
