//! Bearer-token authentication for operator endpoints.

mod extractor;
mod token;

pub use extractor::AuthUser;
pub use token::{Claims, TokenIssuer};
