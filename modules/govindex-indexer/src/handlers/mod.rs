//! One handler per governor event kind.

mod lifecycle;
mod proposal_created;
mod vote_cast;

pub use lifecycle::{handle_proposal_canceled, handle_proposal_executed, handle_proposal_queued};
pub use proposal_created::handle_proposal_created;
pub use vote_cast::{handle_vote_cast, handle_vote_cast_with_params};
