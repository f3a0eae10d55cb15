pub mod webhook_event;
pub mod webhook_route;
