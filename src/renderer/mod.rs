pub mod chain;
pub mod components;
pub mod renderer;
pub mod renders;
pub mod traits;

pub use chain::*;
pub use components::*;
pub use renderer::*;
pub use traits::*;
