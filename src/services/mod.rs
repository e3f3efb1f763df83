//! Services Layer
//!
//! Business logic spanning several tables, extracted from HTTP handlers.
//! Every function takes the store handle explicitly.

pub mod circulation_service;
pub mod csv_service;
pub mod report_service;
