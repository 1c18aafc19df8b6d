
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::{debug, error, warn};
use url::Url;

/// Configuration for headless page rendering.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Number of end-of-page scroll triggers after initial load, used to
    /// attach lazy-loaded content.
    pub scroll_passes: u32,
    /// Idle wait after each scroll trigger in milliseconds.
    pub scroll_wait_ms: u64,
    /// Timeout for page navigation in milliseconds.
    pub navigation_timeout_ms: u64,
    /// Whether to run the browser in headless mode.
    pub headless: bool,
    /// Browser window width.
    pub window_width: u32,
    /// Browser window height.
    pub window_height: u32,
    /// Additional Chrome arguments.
    pub chrome_args: Vec<String>,
    /// User agent string to use.
    pub user_agent: String,
}

impl Default for FetcherConfig {
    #[inline]
    fn default() -> Self {
        Self {
            scroll_passes: 5,
            scroll_wait_ms: 500,
            navigation_timeout_ms: 30_000,
            headless: true,
            window_width: 1280,
            window_height: 720,
            chrome_args: vec![
                "--no-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
                "--disable-gpu".to_string(),
                "--disable-extensions".to_string(),
                "--disable-plugins".to_string(),
                "--disable-background-timer-throttling".to_string(),
                "--disable-renderer-backgrounding".to_string(),
                "--disable-backgrounding-occluded-windows".to_string(),
            ],
            user_agent: "webrag/0.1.0 (Page Indexer)".to_string(),
        }
    }
}

impl FetcherConfig {
    /// Validate the fetcher configuration.
    #[inline]
    pub fn validate(&self) -> Result<()> {
        if self.navigation_timeout_ms == 0 || self.navigation_timeout_ms > 300_000 {
            return Err(anyhow!(
                "Invalid navigation timeout: {}ms (must be between 1 and 300000)",
                self.navigation_timeout_ms
            ));
        }

        if self.scroll_passes > 100 {
            return Err(anyhow!(
                "Invalid scroll pass count: {} (must be at most 100)",
                self.scroll_passes
            ));
        }

        if self.window_width < 100
            || self.window_width > 4000
            || self.window_height < 100
            || self.window_height > 4000
        {
            return Err(anyhow!(
                "Invalid window dimensions: {}x{} (must be between 100 and 4000)",
                self.window_width,
                self.window_height
            ));
        }

        Ok(())
    }
}

/// Renders pages in a headless browser, triggering lazy-loaded content with
/// end-of-page scrolls before capturing the final HTML.
pub struct PageFetcher {
    browser: Browser,
    config: FetcherConfig,
}

impl PageFetcher {
    /// Launch a browser instance with the given configuration.
    #[inline]
    pub fn new(config: FetcherConfig) -> Result<Self> {
        config.validate()?;

        let args: Vec<&OsStr> = config.chrome_args.iter().map(OsStr::new).collect();
        let launch_options = LaunchOptions {
            headless: config.headless,
            window_size: Some((config.window_width, config.window_height)),
            args,
            ..Default::default()
        };

        let browser =
            Browser::new(launch_options).with_context(|| "Failed to launch browser instance")?;

        Ok(Self { browser, config })
    }

    /// Render a page and return its final HTML. This is the raising inner
    /// call; navigation, timeout and protocol errors propagate to the
    /// caller. The tab is closed on all exit paths.
    #[inline]
    pub async fn render_page(&self, url: &Url) -> Result<String> {
        let tab = self
            .browser
            .new_tab()
            .with_context(|| "Failed to create browser tab")?;

        tab.set_user_agent(&self.config.user_agent, None, None)
            .with_context(|| "Failed to set user agent")?;

        let result = self.render_on_tab(&tab, url).await;

        if let Err(e) = tab.close(true) {
            warn!("Failed to close browser tab for {}: {}", url, e);
        }

        result
    }

    async fn render_on_tab(&self, tab: &Arc<Tab>, url: &Url) -> Result<String> {
        let url_str = url.as_str();
        debug!("Navigating to URL: {}", url_str);

        tab.navigate_to(url_str)
            .with_context(|| format!("Failed to navigate to {}", url_str))?;

        let navigation_timeout = Duration::from_millis(self.config.navigation_timeout_ms);
        tokio::time::timeout(navigation_timeout, async {
            tab.wait_until_navigated()
                .with_context(|| format!("Navigation to {} did not complete", url_str))?;

            if let Err(e) = tab.wait_for_element("body") {
                warn!("Failed to wait for body element: {}", e);
            }

            Ok::<(), anyhow::Error>(())
        })
        .await
        .map_err(|_| anyhow!("Navigation timeout after {:?}", navigation_timeout))??;

        // Trigger lazy-loaded content with repeated end-of-page scrolls.
        for pass in 0..self.config.scroll_passes {
            tab.evaluate("window.scrollTo(0, document.body.scrollHeight)", false)
                .with_context(|| format!("Scroll pass {} failed for {}", pass + 1, url_str))?;
            tokio::time::sleep(Duration::from_millis(self.config.scroll_wait_ms)).await;
        }

        let content = tab
            .get_content()
            .with_context(|| format!("Failed to get page content for {}", url_str))?;

        debug!(
            "Rendered {} bytes of content from {}",
            content.len(),
            url_str
        );
        Ok(content)
    }

    /// Render a page, collapsing any failure to an empty string. This is
    /// the outermost boundary the pipeline consumes: errors are logged, not
    /// surfaced, so one bad page never takes the whole run down.
    #[inline]
    pub async fn fetch_rendered(&self, url: &Url) -> String {
        match self.render_page(url).await {
            Ok(html) => html,
            Err(e) => {
                error!("Failed to render {}: {:#}", url, e);
                String::new()
            }
        }
    }
}
