pub mod cache;
pub mod request;
pub mod source;
pub mod store;

pub use cache::*;
pub use request::*;
pub use source::*;
pub use store::*;
