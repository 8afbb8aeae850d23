//! GitHub commit-search discovery.

pub mod search;
pub mod transport;

pub use search::{GitHubSearchProvider, ProfileRepositoryProvider};
pub use transport::{GetRequest, HttpResponse, HttpTransport, ReqwestTransport};
