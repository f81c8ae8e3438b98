//! Domain layer for the restaurant services.
//!
//! This crate provides:
//! - the [`Aggregate`] and [`DomainEvent`] traits
//! - the [`Repository`] contract and an in-memory [`MemoryStore`]
//! - the generic [`CommandHandler`] (load, mutate, persist, publish)
//! - one module per service: order, kitchen, reservation, menu,
//!   inventory and user, each with its state machine, events, repository
//!   contract and application service

pub mod aggregate;
pub mod command;
pub mod error;
pub mod inventory;
pub mod kitchen;
pub mod memory;
pub mod menu;
pub mod order;
pub mod repository;
pub mod reservation;
pub mod user;

pub use aggregate::{Aggregate, DomainEvent};
pub use command::{CommandHandler, CommandResult};
pub use error::{DomainError, Result};
pub use memory::MemoryStore;
pub use repository::{ListQuery, Page, Repository, RepositoryError, RepositoryResult};
