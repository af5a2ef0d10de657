pub mod prelude;

pub mod device;
pub mod search_event;
