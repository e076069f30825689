//! Pure computation over attendance and leave rows. Nothing in here touches
//! the record store.

pub mod attendance;
pub mod leave;
pub mod report;
