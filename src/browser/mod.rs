pub mod context;
pub mod headless;

pub use context::{CdpContext, CdpContextFactory};
pub use headless::{launch_clean_browser, LaunchedBrowser};
