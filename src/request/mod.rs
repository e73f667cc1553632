//! Request Module
//!
//! HTTP fetching glue around the file memoizer: user agents, proxy lookup,
//! failure logging and the cached `request` entry point.

mod agents;
mod client;
mod failure_log;
mod proxy;

pub use agents::UserAgent;
pub use client::{Requester, RequestOptions, ResponseType, CACHE_NAMESPACE};
pub use failure_log::{FailureLog, FailureRecord};
pub use proxy::{read_proxy_line, ProxyResolver, PROXY_LIST_TTL};
