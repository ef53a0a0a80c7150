//! `eventposter-auth` — identity boundary: accounts, bearer tokens, passwords.
//!
//! This crate is intentionally decoupled from HTTP and storage. It defines what
//! an account looks like, how credentials are hashed and verified, and how a
//! bearer token maps back to an [`Identity`].

pub mod account;
pub mod claims;
pub mod identity;
pub mod jwt;
pub mod password;
pub mod roles;

pub use account::{Account, LoginRequest, LoginResponse, RegisterAccountRequest};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use identity::Identity;
pub use jwt::{Hs256Jwt, JwtValidator, TokenIssuer};
pub use password::{PasswordError, hash_password, verify_password};
pub use roles::Role;
