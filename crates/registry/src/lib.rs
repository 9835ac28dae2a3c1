#![forbid(unsafe_code)]

mod clock;
mod code;
mod entry;
mod policy;
mod reaper;
mod redeem;
mod remover;
mod store;

#[cfg(test)]
mod testing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use code::generate_code;
pub use entry::Entry;
pub use policy::Policy;
pub use reaper::{ReaperHandle, SweepReport, spawn_reaper};
pub use redeem::{OpenRedemption, Redeemed, Redemption};
pub use remover::{FileRemover, FsRemover};
pub use store::Registry;
