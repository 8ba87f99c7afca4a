/// A macro to simplify optional read-through caching using Redis.
///
/// When a cache is configured, this macro checks whether the value is present.
/// If found, it returns the cached value.
/// If not found, it executes the provided block to compute the value,
/// stores it in the cache, and then returns the computed value.
/// Without a cache the block is simply executed.
///
/// # Arguments
/// * `$cache`: An `Option<&Cache>`. The cache must have `get_from_cache` and
///   `set_in_background` methods.
/// * `$key`: The key to use for caching the value.
/// * `$ttl`: The time-to-live (TTL) for the cached value in seconds.
/// * `$block`: The future to await if the value is not found in cache.
///
/// # Example
/// ```rust,ignore
/// let genres = cached!(self.cache.as_ref(), CacheKey::GenreList(lang), 86400, async move {
///     fetch_genres_from_api().await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        match $cache {
            Some(cache) => {
                if let Some(cached) = cache.get_from_cache(&$key).await? {
                    Ok(cached)
                } else {
                    let value = $block.await?;
                    cache.set_in_background(&$key, &value, $ttl);
                    Ok(value)
                }
            }
            None => $block.await,
        }
    }};
}
