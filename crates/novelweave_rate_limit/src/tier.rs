//! Tier trait for API quota constraints.

/// Quota constraints of a provider plan.
///
/// `None` means unlimited.
///
/// # Example
///
/// ```
/// use novelweave_rate_limit::Tier;
///
/// struct Trial;
///
/// impl Tier for Trial {
///     fn rpm(&self) -> Option<u32> { Some(10) }
///     fn max_concurrent(&self) -> Option<u32> { Some(1) }
///     fn name(&self) -> &str { "Trial" }
/// }
///
/// assert_eq!(Trial.rpm(), Some(10));
/// ```
pub trait Tier: Send + Sync {
    /// Requests per minute limit.
    fn rpm(&self) -> Option<u32>;

    /// Maximum requests in flight.
    fn max_concurrent(&self) -> Option<u32>;

    /// Name of the tier (e.g., "Free").
    fn name(&self) -> &str;
}
