pub mod debounce;
pub mod event_bus;
pub mod session;
pub mod url_state;

pub use debounce::*;
pub use event_bus::*;
pub use session::*;
pub use url_state::*;
