pub mod abstraction;
pub mod builder;
pub mod layers;
pub mod merge;
pub mod preprocess;
pub mod replace_map;
pub mod view;
pub mod violations;

pub use abstraction::*;
pub use builder::*;
pub use layers::*;
pub use merge::*;
pub use preprocess::*;
pub use replace_map::*;
pub use view::*;
pub use violations::*;
