//! Route 53 VPC association authorizations

pub mod authorization;
pub mod identifier;
pub mod lookup;
pub mod operations;

pub use identifier::{AuthorizationId, IdentifierError};
pub use operations::{AuthorizationPage, AuthorizedVpc, Route53Operations};
