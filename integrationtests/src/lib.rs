pub mod setup;
pub mod upstreammock;
