//! Server crate for the box-office predictor.
//!
//! This crate contains the service that owns the published pipeline and
//! coordinates retraining with prediction.

pub mod service;

pub use service::{BoxOfficeService, ServiceError};
