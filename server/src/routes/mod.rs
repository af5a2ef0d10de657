mod analytics;
mod app_router;
mod devices;
mod events;
mod feed;

pub use app_router::AppRouter;
