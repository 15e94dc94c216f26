mod author;
mod backend;
mod event;
mod turn;

pub use author::*;
pub use backend::*;
pub use event::*;
pub use turn::*;
