mod clock;
mod codec;
mod session;

pub use clock::*;
pub use codec::*;
pub use session::*;
