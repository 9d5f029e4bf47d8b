pub mod error;
pub mod handlers;
pub mod pagination;
pub mod panel;
pub mod rank;
pub mod registry;
pub mod types;

pub use error::LeaderboardError;
pub use pagination::{LayoutMeasurement, Pagination, PaginationLimits};
pub use panel::LeaderboardPanel;
pub use rank::RankBadge;
pub use registry::{PanelRegistry, SharedPanelRegistry};
pub use types::*;
