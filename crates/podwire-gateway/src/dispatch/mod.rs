//! Remote dispatch: classification, routing and execution of inbound commands.

pub mod dispatcher;
pub mod handlers;
pub mod pattern;
pub mod routes;

pub use dispatcher::Dispatcher;
pub use handlers::container_routes;
pub use pattern::PathPattern;
pub use routes::{RouteHandler, RouteRequest, RouteTable};
