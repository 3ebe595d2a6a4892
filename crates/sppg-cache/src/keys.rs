//! Namespaced key builders for the cache layer.
//!
//! The layout is persisted state; existing stored entries depend on it.

/// Namespace used for entries not scoped to any tenant.
pub const GLOBAL_NAMESPACE: &str = "global";

/// Resolve the namespace segment for a tenant.
pub fn namespace(tenant: Option<&str>) -> &str {
    tenant.unwrap_or(GLOBAL_NAMESPACE)
}

/// `cache:{tenant|global}:{key}` — one cached entry.
pub fn cache(tenant: Option<&str>, key: &str) -> String {
    format!("cache:{}:{}", namespace(tenant), key)
}

/// `tag:{tenant|global}:{tag}` — reverse index set of cache keys.
pub fn tag(tenant: Option<&str>, tag: &str) -> String {
    format!("tag:{}:{}", namespace(tenant), tag)
}

/// Glob matching every cache entry of one tenant.
pub fn tenant_cache_pattern(tenant: &str) -> String {
    format!("cache:{tenant}:*")
}

/// Glob matching every tag index of one tenant.
pub fn tenant_tag_pattern(tenant: &str) -> String {
    format!("tag:{tenant}:*")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout_is_stable() {
        assert_eq!(cache(Some("t1"), "menus"), "cache:t1:menus");
        assert_eq!(cache(None, "menus"), "cache:global:menus");
        assert_eq!(tag(Some("t1"), "menus"), "tag:t1:menus");
        assert_eq!(tag(None, "menus"), "tag:global:menus");
        assert_eq!(tenant_cache_pattern("t1"), "cache:t1:*");
        assert_eq!(tenant_tag_pattern("t1"), "tag:t1:*");
    }
}
