//! Usage accounting: approximate token counting over a subject's message
//! history, windowed into daily/monthly budgets and mapped to a severity
//! level. Recomputed on demand; a snapshot is a view, never a stored entity.

pub mod budgets;
pub mod handlers;
pub mod snapshot;
pub mod tokens;
