//! Host page selector contract
//!
//! Every selector and label the content side matches against the
//! marketplace markup. The markup is unversioned; when the site changes,
//! this is the file to update.

/// One result card.
pub const LISTING: &str = ".hz-Listing";
/// Class name of a result card, for added-node checks.
pub const LISTING_CLASS: &str = "hz-Listing";

/// Priority label inside a card ("Topadvertentie", "Dagtopper").
pub const PRIORITY_LABEL: &str = ".hz-Listing-priority span";
pub const TOP_AD_LABEL: &str = "Topadvertentie";
pub const DAGTOPPER_LABEL: &str = "Dagtopper";

/// Seller block of a card, also holding the company website link.
pub const SELLER_LINK: &str = ".hz-Listing-seller-link";
/// Elements inside the seller block whose text may be the website link.
pub const SELLER_LINK_TEXT: &str = "span, a";
pub const VISIT_WEBSITE_LABEL: &str = "Bezoek website";

/// Seller name element proper.
pub const SELLER_NAME_TEXT: &str = ".hz-Listing-seller-name";
/// Seller name, with the seller link as fallback.
pub const SELLER_NAME: &str = ".hz-Listing-seller-name, .hz-Listing-seller-link";
/// Container the blacklist button row is inserted after.
pub const SELLER_NAME_CONTAINER: &str = ".hz-Listing-seller-name-container";

/// Card title.
pub const LISTING_TITLE: &str = ".hz-Listing-title";

/// Eye-catching sticker markers.
pub const OPVAL_STICKERS: [&str; 2] = [
    ".hz-Listing-Opvalsticker-wrapper",
    "[data-testid=\"listing-opval-sticker\"]",
];

/// Lazy-loaded ad slot wrapper that leaves a gap when emptied.
pub const BANNER_CONTAINER: &str = "li.bannerContainerLoading";
/// Class name of a banner, for added-node checks.
pub const BANNER_CLASS: &str = "hz-Banner";
/// Google ad marker, for added-node checks.
pub const GOOGLE_AD_MARKER: &str = "[data-google-query-id]";
/// Element present once an ad-bearing page has rendered.
pub const ADSENSE_CONTAINER: &str = "#adsense-container";

/// Non-listing advertisement elements, deleted outright.
pub const AD_ELEMENTS: [&str; 25] = [
    "#adsense-container",
    "#adsense-container-bottom-lazy",
    "#adBlock",
    ".hz-Banner",
    ".hz-Banner--fluid",
    "#banner-rubrieks-dt",
    "[data-google-query-id]",
    "[id*=\"google_ads_iframe\"]",
    "[id*=\"google_ads_top_frame\"]",
    "[aria-label=\"Advertisement\"]",
    "[title=\"3rd party ad content\"]",
    ".i_.div",
    "[data-ad-container]",
    "[data-bg=\"true\"]",
    "[class*=\"adsbygoogle\"]",
    "ins.adsbygoogle",
    "iframe[src*=\"googleads\"]",
    "iframe[src*=\"doubleclick\"]",
    "[id*=\"div-gpt-ad\"]",
    ".hz-Listings__container--cas[data-testid=\"BottomBlockLazyListings\"]",
    "[class*=\"creative\"]",
    "div[id^=\"google_ads_iframe\"]",
    "div[aria-label=\"Advertisement\"]",
    ".creative",
    ".bannerContainerLoading",
];

/// Elements whose presence means the result page has rendered.
pub const CONTENT_READY: [&str; 2] = [LISTING, ADSENSE_CONTAINER];

/// Prefix of every id/class this extension adds to the page.
pub const OWN_PREFIX: &str = "cleanplaats-";
/// Row holding an injected blacklist button.
pub const BLACKLIST_BUTTON_ROW: &str = ".cleanplaats-blacklist-btn-row";
/// Injected blacklist button inside that row.
pub const BLACKLIST_BUTTON: &str = ".cleanplaats-blacklist-btn";
/// Attribute carrying the seller name on injected buttons.
pub const SELLER_ATTR: &str = "data-seller";

// =============================================================================
// Photo carousel
// =============================================================================

pub const CAROUSEL: &str = ".Carousel-navigationContainer";
pub const CAROUSEL_NEXT: &str = ".Carousel-navigationContainer button[aria-label=\"Volgende foto\"]";
pub const CAROUSEL_PREVIOUS: &str = ".Carousel-navigationContainer button[aria-label=\"Vorige foto\"]";
