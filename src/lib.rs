//! Attendance-to-payroll engine for daily wage workforce management
//!
//! This crate tracks each worker's attendance per assigned day through a
//! verification state machine, derives the day's payroll, lets reviewers
//! stage and commit payroll corrections, and rolls a month of days into a
//! payroll document that can be locked for good.

#![warn(missing_docs)]

pub mod aggregation;
pub mod api;
pub mod attendance;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod review;
pub mod store;
