//! Reference tables and wire shapes shared by the API and its adapters.

pub mod bounty;
pub mod chain;
pub mod issue;
pub mod language;
pub mod license;
pub mod network;
pub mod pagination;
pub mod platform;
pub mod pull_request;
pub mod repository;
pub mod token;

pub use bounty::Bounty;
pub use chain::Chain;
pub use issue::{Issue, IssueAuthor, IssueDetail, IssueLabel, IssueState};
pub use language::Language;
pub use license::License;
pub use network::Network;
pub use pagination::Pagination;
pub use platform::Platform;
pub use pull_request::{PullRequest, PullRequestState};
pub use repository::Repository;
pub use token::Token;
