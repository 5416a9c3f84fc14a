//! Domain and wire types consumed from the platform API.

pub mod event;
pub mod inscription;
pub mod page;
pub mod payment;
pub mod ticket;

pub use event::{Event, EventAnalysisRow, EventDraft};
pub use inscription::{Inscription, InscriptionAnalyticsRow, InscriptionStatus};
pub use page::Page;
pub use payment::{Payment, PaymentStatus};
pub use ticket::{Ticket, TicketSale};
