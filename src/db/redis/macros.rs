/// Cache-aside helper around a `Cache`.
///
/// Returns the cached value on a hit. On a miss, or when the cache lookup
/// itself fails, evaluates `$block`, queues the result for storage and
/// returns it. A broken cache never fails the caller; errors from `$block`
/// propagate with `?`.
///
/// # Arguments
/// * `$cache`: a `Cache` (or reference to one).
/// * `$key`: the `CacheKey` to read and write.
/// * `$ttl`: time-to-live of the stored value in seconds.
/// * `$block`: a future producing `Result<T, E>` on a miss.
///
/// # Example
/// ```rust,ignore
/// let report = cached!(cache, key, 3600, async move { compute_report().await });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        match $cache.get_from_cache(&$key).await {
            Ok(Some(cached)) => {
                tracing::debug!(key = %$key, "Cache hit");
                Ok(cached)
            }
            lookup => {
                if let Err(e) = lookup {
                    tracing::warn!(error = %e, key = %$key, "Cache lookup failed, computing value");
                }
                let value = $block.await?;
                $cache.set_in_background(&$key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
