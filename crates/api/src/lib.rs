//! HTTP surface: route table, server-side guard, session middleware and
//! the handlers built on them.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod default_route;
pub mod guard;
pub mod middleware;
pub mod routing;
