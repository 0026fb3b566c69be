//! Identity provider adapters

mod token;

pub use token::TokenIdentityProvider;
