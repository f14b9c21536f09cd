mod common;
mod event;
mod participation;
mod payload;
mod user;

pub use common::*;
pub use event::*;
pub use participation::*;
pub use payload::*;
pub use user::*;
