//! Authentication and authorization.
//!
//! # Authentication
//!
//! Users log in via `/authentication/login` with email, password and role and receive a JWT
//! access/refresh pair. Both are set as `HttpOnly` cookies; the access token is also accepted as
//! `Authorization: Bearer <token>`. `/authentication/refresh` trades the refresh cookie for a new
//! pair. Every authenticated request reloads the account, so deactivation takes effect at once.
//!
//! # Authorization
//!
//! Roles (customer, hotel manager, admin) map to `(Resource, Operation)` grants; see
//! [`permissions`]. Ownership of a specific entity is checked in the handler.
//!
//! # Modules
//!
//! - [`current_user`]: the `CurrentUser` extractor
//! - [`password`]: Argon2id hashing and password rules
//! - [`permissions`]: role table and the `RequiresPermission` extractor
//! - [`session`]: JWT issue and verification
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use hotelctl::auth::permissions::{RequiresPermission, operation, resource};
//!
//! async fn create_hotel(
//!     State(state): State<AppState>,
//!     perm: RequiresPermission<resource::Hotels, operation::CreateOwn>,
//!     Json(body): Json<HotelCreate>,
//! ) -> Result<Json<HotelResponse>, Error> {
//!     // perm.user is the authenticated manager or admin
//! }
//! ```

pub mod current_user;
pub mod password;
pub mod permissions;
pub mod session;
