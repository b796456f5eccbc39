//! Result providers and lazy concatenation of two result sets.

use std::sync::Arc;

use async_trait::async_trait;
use octofhir_bridge_core::{PageConfig, PageRequest, PagedResult, Result};
use tracing::debug;

/// A lazily paged result set.
///
/// Implementations must keep the underlying order stable across calls so
/// that consecutive pages never overlap or skip items.
#[async_trait]
pub trait ResultProvider<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    /// Total number of matches, independent of paging.
    async fn total(&self) -> Result<usize>;

    /// Materializes the window `[offset, offset + count)`. Windows past
    /// the end come back empty or short.
    async fn page(&self, offset: usize, count: usize) -> Result<Vec<T>>;
}

/// Resolves `request` against `provider`, clamping with `config`.
pub async fn fetch_page<T>(
    provider: &dyn ResultProvider<T>,
    request: PageRequest,
    config: &PageConfig,
) -> Result<PagedResult<T>>
where
    T: Send + Sync + 'static,
{
    let total = provider.total().await?;
    let (offset, count) = request.normalize(config);
    let items = if count == 0 || offset >= total {
        Vec::new()
    } else {
        provider.page(offset, count).await?
    };
    Ok(PagedResult::new(items, total, offset, count))
}

/// Concatenates two providers: all of the first result set, then all of
/// the second. Pages are pulled lazily from whichever side the requested
/// window overlaps.
pub struct MergedResultProvider<T>
where
    T: Send + Sync + 'static,
{
    first: Arc<dyn ResultProvider<T>>,
    second: Arc<dyn ResultProvider<T>>,
    first_total: usize,
    second_total: usize,
}

impl<T> MergedResultProvider<T>
where
    T: Send + Sync + 'static,
{
    /// Composes two providers.
    ///
    /// Totals are probed once here so page windowing never re-counts.
    /// When either side is empty the other provider is returned
    /// unchanged instead of wrapping it.
    pub async fn compose(
        first: Arc<dyn ResultProvider<T>>,
        second: Arc<dyn ResultProvider<T>>,
    ) -> Result<Arc<dyn ResultProvider<T>>> {
        let first_total = first.total().await?;
        let second_total = second.total().await?;
        if second_total == 0 {
            return Ok(first);
        }
        if first_total == 0 {
            return Ok(second);
        }
        debug!(first_total, second_total, "composed merged result provider");
        Ok(Arc::new(Self {
            first,
            second,
            first_total,
            second_total,
        }))
    }
}

#[async_trait]
impl<T> ResultProvider<T> for MergedResultProvider<T>
where
    T: Send + Sync + 'static,
{
    async fn total(&self) -> Result<usize> {
        Ok(self.first_total + self.second_total)
    }

    async fn page(&self, offset: usize, count: usize) -> Result<Vec<T>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut items = Vec::with_capacity(count);
        if offset < self.first_total {
            let take = count.min(self.first_total - offset);
            items.extend(self.first.page(offset, take).await?);
        }
        let end = offset + count;
        if end > self.first_total {
            let second_offset = offset.saturating_sub(self.first_total);
            let take = (end - self.first_total).min(count);
            items.extend(self.second.page(second_offset, take).await?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<i64>);

    #[async_trait]
    impl ResultProvider<i64> for Fixed {
        async fn total(&self) -> Result<usize> {
            Ok(self.0.len())
        }

        async fn page(&self, offset: usize, count: usize) -> Result<Vec<i64>> {
            Ok(self.0.iter().copied().skip(offset).take(count).collect())
        }
    }

    fn provider(items: Vec<i64>) -> Arc<dyn ResultProvider<i64>> {
        Arc::new(Fixed(items))
    }

    #[tokio::test]
    async fn test_empty_side_returns_other_unchanged() {
        let first = provider(vec![1, 2, 3]);
        let empty = provider(Vec::new());

        let composed = MergedResultProvider::compose(first.clone(), empty.clone())
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&composed, &first));

        let composed = MergedResultProvider::compose(empty.clone(), first.clone())
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&composed, &first));
    }

    #[tokio::test]
    async fn test_merged_total_is_sum() {
        let merged = MergedResultProvider::compose(provider(vec![1, 2, 3]), provider(vec![4, 5]))
            .await
            .unwrap();
        assert_eq!(merged.total().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_page_spanning_the_boundary() {
        let merged =
            MergedResultProvider::compose(provider(vec![1, 2, 3]), provider(vec![4, 5, 6]))
                .await
                .unwrap();
        assert_eq!(merged.page(1, 4).await.unwrap(), vec![2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_page_entirely_in_second() {
        let merged =
            MergedResultProvider::compose(provider(vec![1, 2, 3]), provider(vec![4, 5, 6]))
                .await
                .unwrap();
        assert_eq!(merged.page(5, 2).await.unwrap(), vec![6]);
    }

    #[tokio::test]
    async fn test_concatenation_order_via_paging() {
        let merged = MergedResultProvider::compose(provider(vec![1, 2]), provider(vec![3, 4]))
            .await
            .unwrap();
        let mut all = Vec::new();
        let mut offset = 0;
        loop {
            let page = merged.page(offset, 3).await.unwrap();
            if page.is_empty() {
                break;
            }
            offset += page.len();
            all.extend(page);
        }
        assert_eq!(all, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_fetch_page_normalizes_and_reports_total() {
        let config = PageConfig {
            default_count: 2,
            max_count: 3,
        };
        let source = provider(vec![1, 2, 3, 4, 5]);

        let page = fetch_page(source.as_ref(), PageRequest::first(), &config)
            .await
            .unwrap();
        assert_eq!(page.items, vec![1, 2]);
        assert_eq!(page.total, 5);
        assert!(page.has_more());

        let page = fetch_page(source.as_ref(), PageRequest::new(0, 50), &config)
            .await
            .unwrap();
        assert_eq!(page.items, vec![1, 2, 3]);
        assert_eq!(page.page_size, 3);
    }

    #[tokio::test]
    async fn test_fetch_page_beyond_end_is_empty() {
        let config = PageConfig::default();
        let source = provider(vec![1, 2]);
        let page = fetch_page(source.as_ref(), PageRequest::new(10, 5), &config)
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 2);
        assert!(!page.has_more());
    }
}
