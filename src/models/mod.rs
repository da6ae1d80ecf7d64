//! Request-scoped values exchanged with clients and the object store.
//!
//! Nothing here is persisted; every value lives for one HTTP request.

pub mod responses;
pub mod signed_link;
