pub mod progress;
pub mod revoke_approvals;
pub mod search_replace;
pub mod switch_approval;
