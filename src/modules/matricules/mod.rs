//! Identifier generation, inspection and batch backfill.

pub mod batch;
pub mod controller;
pub mod model;
pub mod router;
pub mod rules;
pub mod sequence;
pub mod service;

pub use self::service::MatriculeService;
