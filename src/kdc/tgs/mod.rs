//! The Ticket-Granting Service: a linear pipeline from decoded TGS-REQ
//! to TGS-REP, with no back-edges; the first failing stage terminates
//! the request.

mod context;
pub use context::TicketGrantingContext;

mod service;
pub use service::execute;

mod ticket;
pub use ticket::{EncTicketPartBuilder, TicketBody};
