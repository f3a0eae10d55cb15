pub mod system_route;
pub mod webhook;
