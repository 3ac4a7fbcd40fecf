#![forbid(unsafe_code)]

pub mod repository;
pub mod rest;
pub mod sqlite;

pub use repository::{
    CourseRepository, InMemoryRepository, ProgressRecord, ProgressRepository, Storage,
    StorageError, TicketRepository, UserRepository,
};
pub use rest::RestConfig;
