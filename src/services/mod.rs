pub mod cache_key;
pub mod cdp;
pub mod fetcher;
pub mod pipeline;
pub mod session;
pub mod storage;
pub mod template;
pub mod token_pool;

pub use cache_key::{artifact_name, cache_key};
pub use cdp::CdpConnector;
pub use fetcher::SvgFetcher;
pub use pipeline::RenderPipeline;
pub use session::{BrowserConnector, BrowserSession, ElementSize, RenderSurface, SessionError};
pub use storage::{ObjectStore, StorageCache, StoreError, SupabaseStore};
pub use template::wrap_svg;
pub use token_pool::{Clock, Credential, SystemClock, TokenPool};
