//! frest - request validation and response marshaling for axum.
//!
//! Handlers declare their body schema with [`Valid<T>`] and return a
//! [`Reply`]; schema instances anywhere in the reply are rendered to plain
//! JSON mappings. [`Swagger`] optionally records route registrations and
//! serves them as an OpenAPI document.
//!
//! ```rust,ignore
//! #[derive(Serialize, Deserialize, ToSchema)]
//! struct Person {
//!     name: String,
//!     age: i32,
//! }
//!
//! async fn create_person(Valid(person): Valid<Person>) -> Reply {
//!     Reply::model(person).with_status(StatusCode::CREATED)
//! }
//!
//! let app = Swagger::default()
//!     .init_app(Router::new())
//!     .route("/person", &[Method::POST], create_person)
//!     .finish();
//! ```

pub mod config;
pub mod docs;
pub mod error;
pub mod extract;
pub mod logging;
pub mod projection;
pub mod reply;
pub mod schema;
pub mod validation;

pub use docs::{ApiRouter, RouteDoc, RouteRecord, Swagger};
pub use error::{FrestError, FrestResult};
pub use extract::Valid;
pub use projection::{exclude, include};
pub use reply::{Item, Reply};
pub use schema::{IntoMapping, Schema};
pub use validation::{ErrorKind, ErrorRecord, LocItem, ValidationErrors};
