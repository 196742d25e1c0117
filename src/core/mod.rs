//! # Core Application Logic
//!
//! This module contains Karte's business logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (app data)     │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │  • scroll / filler      │
//!                    │    state machines       │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    TUI     │      │    API     │      │   other    │
//!     │  Adapter   │      │  boundary  │      │  adapters  │
//!     │ (ratatui)  │      │ (reqwest)  │      │  (future)  │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! The scroll animator and filler calculator live here rather than in the
//! TUI layer: they are advanced by explicit tick/measurement inputs, so
//! they stay deterministic and renderer-agnostic.

pub mod action;
pub mod config;
pub mod filler;
pub mod ingest;
pub mod message;
pub mod scroll;
pub mod session;
pub mod state;
