pub mod mod_roles;
pub mod purge;
pub mod sticky_channel;
pub mod sticky_manager;
pub mod sticky_registry;
pub mod sticky_store;
