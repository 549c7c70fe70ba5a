//! HTTP backend for managing tasks: a hand-rolled router and middleware
//! chain over hyper, a domain service, and a SQL repository behind a
//! trait.

pub mod config;
pub mod dto;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod http;
pub mod middleware;
pub mod repository;
pub mod router;
pub mod server;
pub mod service;

pub use config::Settings;
pub use entity::Task;
pub use error::{Error, Result};
pub use handlers::TaskHandlers;
pub use http::{Handler, Middleware, MiddlewareChain, Request, Response};
pub use repository::{InMemoryTaskRepository, SqlTaskRepository, TaskRepository};
pub use router::ApiRouter;
pub use server::HttpServer;
pub use service::TaskService;
