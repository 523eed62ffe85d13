/// Middleware module
///
/// Authentication gate wiring for protected resources.

mod jwt_middleware;

pub use jwt_middleware::JwtMiddleware;
