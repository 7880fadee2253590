mod channels;
mod control;
mod sync_adapter;

pub use channels::*;
pub use control::*;
pub use sync_adapter::*;
