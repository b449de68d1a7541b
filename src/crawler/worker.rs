use crate::content::{ContentDocument, ContentExtractor, ExtractionError};
use crate::discovery::{ExtractedLink, LinkExtractor};
use crate::fetch::{FetchLayer, Interaction, PageFetchResult};
use crate::frontier::CrawlTarget;
use tracing::debug;

/// Everything learned from visiting one target
///
/// The fetched HTML is consumed by link and content extraction; `fetch.html`
/// is left empty.
#[derive(Debug)]
pub struct PageVisit {
    pub target: CrawlTarget,
    pub fetch: PageFetchResult,
    pub links: Vec<ExtractedLink>,
    /// `None` when the fetch failed
    pub document: Option<Result<ContentDocument, ExtractionError>>,
}

/// Fetches a target and extracts links and content from it
///
/// Workers hold no crawl state; the coordinator applies each [`PageVisit`].
#[derive(Clone)]
pub struct PageWorker {
    fetcher: FetchLayer,
    links: LinkExtractor,
    content: ContentExtractor,
}

impl PageWorker {
    pub fn new(fetcher: FetchLayer, links: LinkExtractor, content: ContentExtractor) -> Self {
        Self {
            fetcher,
            links,
            content,
        }
    }

    pub fn fetcher(&self) -> &FetchLayer {
        &self.fetcher
    }

    pub async fn visit(&self, target: CrawlTarget, interaction: Interaction) -> PageVisit {
        let mut fetch = self.fetcher.fetch(&target.url, interaction).await;

        if !fetch.is_success() {
            return PageVisit {
                target,
                fetch,
                links: Vec::new(),
                document: None,
            };
        }

        let html = std::mem::take(&mut fetch.html);
        let links = self.links.extract(&html, &fetch.final_url);
        let document = self.content.extract(&target.url, &html);
        debug!(
            "Visited {} ({} links, {} bytes)",
            target.url,
            links.len(),
            html.len()
        );

        PageVisit {
            target,
            fetch,
            links,
            document: Some(document),
        }
    }
}
