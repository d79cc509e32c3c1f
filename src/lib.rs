//! STAKEBOOK — Funded Betting-Challenge Ledger & Compliance Engine
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod api;
pub mod config;
pub mod engine;
pub mod ingest;
pub mod odds;
pub mod payout;
pub mod storage;
pub mod types;
