//! Warcouncil - Strategic Decision Layer for RTS Simulations
//!
//! Decides *when* to consult an expensive, latency-bound reasoning service
//! (an LLM) for strategic orders, and *how* those orders become durable
//! per-unit directives, without ever blocking the simulation tick loop.

pub mod coordinator;
pub mod core;
pub mod decision;
pub mod directive;
pub mod events;
pub mod unit;
pub mod world;
