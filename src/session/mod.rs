//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! Login (authorization callback):
//!     claims → token.rs (sign, iat/exp) → store.rs (Set-Cookie)
//!
//! Any later request:
//!     Authorization: Bearer <token>  ─┐
//!     Cookie: session=<token>        ─┴→ store.rs → token.rs (verify)
//!                                          → Some(claims) | None
//! ```
//!
//! # Design Decisions
//! - Stateless: no server-side session table and no revocation list
//! - Identity resolution fails open to anonymous, never to authenticated
//! - Cookie attributes (HttpOnly, Secure, SameSite=Lax, Path=/) are fixed

pub mod cookie;
pub mod extract;
pub mod store;
pub mod token;

pub use extract::{CurrentUser, MaybeUser};
pub use store::SessionStore;
pub use token::{Claims, EmptySecret, SessionToken, TokenCodec};
