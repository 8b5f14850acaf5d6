use crate::{
    markup::{DeprecatedSection, DeprecationOrigin, Document},
    symbol::AvailabilityItem,
};

/// Whether `items` make a symbol deprecated when building for `platform`.
///
/// A symbol is deprecated if an item for the platform is deprecated, if a universal item
/// (`domain == None`) is unconditionally deprecated or unavailable, or if every item is
/// deprecated on its own.
pub fn is_deprecated(items: &[AvailabilityItem], platform: Option<&str>) -> bool {
    deprecating_item(items, platform).is_some()
}

fn deprecating_item<'a>(
    items: &'a [AvailabilityItem],
    platform: Option<&str>,
) -> Option<&'a AvailabilityItem> {
    if let Some(platform) = platform {
        let platform_item = items.iter().find(|item| {
            item.is_deprecated()
                && item
                    .domain
                    .as_deref()
                    .is_some_and(|domain| domain.eq_ignore_ascii_case(platform))
        });
        if platform_item.is_some() {
            return platform_item;
        }
    }
    let universal = items.iter().find(|item| {
        item.domain.is_none()
            && (item.is_unconditionally_deprecated || item.is_unconditionally_unavailable)
    });
    if universal.is_some() {
        return universal;
    }
    if !items.is_empty() && items.iter().all(AvailabilityItem::is_deprecated) {
        return items
            .iter()
            .find(|item| item.message.is_some() || item.renamed.is_some())
            .or(items.first());
    }
    None
}

/// A deprecation notice derived from availability, if the symbol is deprecated.
///
/// The notice carries the item's message, or a pointer to the replacement when the item only
/// names one. Without either the notice is empty, which still marks the symbol deprecated.
pub fn availability_deprecation(
    items: &[AvailabilityItem],
    platform: Option<&str>,
) -> Option<DeprecatedSection> {
    let item = deprecating_item(items, platform)?;
    let message = match (&item.message, &item.renamed) {
        (Some(message), _) if !message.trim().is_empty() => Some(message.trim().to_string()),
        (_, Some(renamed)) => Some(format!("Renamed to `{renamed}`.")),
        _ => None,
    };
    tracing::debug!(
        "[availability_deprecation] deprecated via {:?}: {:?}",
        item.domain,
        message
    );
    Some(DeprecatedSection {
        content: message
            .map(|message| Document::parse(&message, None).blocks)
            .unwrap_or_default(),
        origin: DeprecationOrigin::Availability,
    })
}
