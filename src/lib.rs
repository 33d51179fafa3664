//! Skill Converse - Conversational runtime for message-bus driven voice skills
//!
//! This crate lets a skill become the active converse target, collect and
//! validate replies from the user mid-conversation, and match converse
//! intents while it is active.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod logging;
pub mod ports;
