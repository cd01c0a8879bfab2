//! # tracker-service
//!
//! Application layer: reconciliation and ledger services, the per-community
//! serializer, and the request/response DTOs.

pub mod dto;
pub mod services;

pub use services::{
    BroadcastEventSink, LedgerService, ReconciliationService, ServiceError, ServiceResult,
    TrackerContext, TrackerContextBuilder,
};
