//! HTTP API handlers for crdb-de

pub mod conferences;
pub mod error;
pub mod health;
pub mod parse;
pub mod regattas;
pub mod results;
pub mod schools;
pub mod seasons;
pub mod sse;

pub use conferences::conference_routes;
pub use error::{ApiError, ApiResult};
pub use health::health_routes;
pub use parse::parse_routes;
pub use regattas::regatta_routes;
pub use results::result_routes;
pub use schools::school_routes;
pub use seasons::season_routes;
pub use sse::school_change_stream;
