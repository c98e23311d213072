//! HTTP layer: handlers, middleware, DTOs, the OpenAPI document and the router.

pub mod doc;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
