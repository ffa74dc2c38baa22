pub mod catalog;
pub mod check_ins;
pub mod finalization;
pub mod gateway;
pub mod inventory;
pub mod notifications;
pub mod reservations;
pub mod tickets;
pub mod webhook;
