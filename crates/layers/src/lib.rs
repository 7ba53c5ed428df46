pub mod choropleth;
pub mod markers;
pub mod query;
pub mod results;
pub mod symbology;

pub use choropleth::*;
pub use markers::*;
pub use query::*;
pub use results::*;
pub use symbology::*;
