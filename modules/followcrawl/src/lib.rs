pub mod expansion;
pub mod frontier;
pub mod hydration;
pub mod supervisor;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use expansion::{ExpansionStats, ExpansionWorker};
pub use frontier::{FrontierPick, FrontierSelector, PickSource};
pub use hydration::{HydrationStats, HydrationWorker};
pub use supervisor::{RestartPolicy, Supervisor};
pub use traits::{FollowStore, Neo4jStore, SocialApi};
