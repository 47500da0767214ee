pub mod components;
pub mod literals;
pub mod markdown;
pub mod renderer;
pub mod renders;
pub mod traits;
pub mod type_names;

pub use components::*;
pub use literals::*;
pub use markdown::*;
pub use renderer::*;
pub use renders::*;
pub use traits::*;
pub use type_names::*;
