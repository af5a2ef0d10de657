pub use super::device::Entity as Device;
pub use super::search_event::Entity as SearchEvent;
