pub mod category_feed;
pub mod device_cache;
