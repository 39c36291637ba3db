//! API request handlers

mod events;
mod health;
mod processes;
mod signers;
mod slots;

pub use events::*;
pub use health::*;
pub use processes::*;
pub use signers::*;
pub use slots::*;
