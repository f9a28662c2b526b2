//! Request handlers.

pub mod analyze;
pub mod health;
pub mod pinterest;
pub mod search;
pub mod upload;

pub use analyze::*;
pub use health::*;
pub use pinterest::*;
pub use search::*;
pub use upload::*;
