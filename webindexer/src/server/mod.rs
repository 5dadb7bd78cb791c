mod handler;
mod http;

pub use handler::{parse_basic_auth, IndexRequest, IndexResponse, Indexer, THUMBNAIL_PREFIX};
pub use http::{router, serve};
