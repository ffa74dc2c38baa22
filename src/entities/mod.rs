pub mod attendee;
pub mod check_in;
pub mod event;
pub mod ticket;
pub mod ticket_type;
