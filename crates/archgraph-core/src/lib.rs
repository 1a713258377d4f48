pub mod edge;
pub mod error;
pub mod graph;
pub mod node;
pub mod record;
pub mod settings;
pub mod types;

pub use edge::*;
pub use error::*;
pub use graph::*;
pub use node::*;
pub use record::*;
pub use settings::*;
pub use types::*;
