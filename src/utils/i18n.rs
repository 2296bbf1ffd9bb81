use tracing::warn;

/// Locale used when the configured one has no translation file
pub const FALLBACK_LOCALE: &str = "en";

/// Switch the process-wide locale for user-visible notices
pub fn set_locale(locale: &str) {
    let available = rust_i18n::available_locales!();
    if available.iter().any(|l| *l == locale) {
        rust_i18n::set_locale(locale);
    } else {
        warn!(
            "Locale '{}' is not available ({:?}), falling back to '{}'",
            locale, available, FALLBACK_LOCALE
        );
        rust_i18n::set_locale(FALLBACK_LOCALE);
    }
}

/// Localized day name, 0 = Sunday
pub fn day_name(weekday: u8) -> String {
    let key = match weekday {
        0 => "days.sunday",
        1 => "days.monday",
        2 => "days.tuesday",
        3 => "days.wednesday",
        4 => "days.thursday",
        5 => "days.friday",
        _ => "days.saturday",
    };
    t!(key).to_string()
}
