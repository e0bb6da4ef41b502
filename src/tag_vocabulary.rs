/// Static vocabulary for scene release names: media formats, distribution markers and region codes.
///
/// Everything here works on single tokens, i.e. the pieces of a release name between `-`, `_`,
/// whitespace, dots and brackets.
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// ISO 3166-1 alpha-2 codes.
const ISO_COUNTRY_CODES: &[&str] = &[
    "AD", "AE", "AF", "AG", "AI", "AL", "AM", "AO", "AQ", "AR", "AS", "AT", "AU", "AW", "AX", "AZ", "BA", "BB", "BD", "BE", "BF",
    "BG", "BH", "BI", "BJ", "BL", "BM", "BN", "BO", "BQ", "BR", "BS", "BT", "BV", "BW", "BY", "BZ", "CA", "CC", "CD", "CF", "CG",
    "CH", "CI", "CK", "CL", "CM", "CN", "CO", "CR", "CU", "CV", "CW", "CX", "CY", "CZ", "DE", "DJ", "DK", "DM", "DO", "DZ", "EC",
    "EE", "EG", "EH", "ER", "ES", "ET", "FI", "FJ", "FK", "FM", "FO", "FR", "GA", "GB", "GD", "GE", "GF", "GG", "GH", "GI", "GL",
    "GM", "GN", "GP", "GQ", "GR", "GS", "GT", "GU", "GW", "GY", "HK", "HM", "HN", "HR", "HT", "HU", "ID", "IE", "IL", "IM", "IN",
    "IO", "IQ", "IR", "IS", "IT", "JE", "JM", "JO", "JP", "KE", "KG", "KH", "KI", "KM", "KN", "KP", "KR", "KW", "KY", "KZ", "LA",
    "LB", "LC", "LI", "LK", "LR", "LS", "LT", "LU", "LV", "LY", "MA", "MC", "MD", "ME", "MF", "MG", "MH", "MK", "ML", "MM", "MN",
    "MO", "MP", "MQ", "MR", "MS", "MT", "MU", "MV", "MW", "MX", "MY", "MZ", "NA", "NC", "NE", "NF", "NG", "NI", "NL", "NO", "NP",
    "NR", "NU", "NZ", "OM", "PA", "PE", "PF", "PG", "PH", "PK", "PL", "PM", "PN", "PR", "PS", "PT", "PW", "PY", "QA", "RE", "RO",
    "RS", "RU", "RW", "SA", "SB", "SC", "SD", "SE", "SG", "SH", "SI", "SJ", "SK", "SL", "SM", "SN", "SO", "SR", "SS", "ST", "SV",
    "SX", "SY", "SZ", "TC", "TD", "TF", "TG", "TH", "TJ", "TK", "TL", "TM", "TN", "TO", "TR", "TT", "TV", "TW", "TZ", "UA", "UG",
    "UM", "US", "UY", "UZ", "VA", "VC", "VE", "VG", "VI", "VN", "VU", "WF", "WS", "YE", "YT", "ZA", "ZM", "ZW",
];

/// Non-ISO codes that show up in release names, mapped to the ISO code they mean.
const REGION_ALIASES: &[(&str, &str)] = &[("SP", "ES"), ("UK", "GB"), ("EN", "GB")];

/// Tokens that look like two-letter codes but are release vocabulary.
const NOT_REGIONS: &[&str] = &["CD", "EP", "LP", "VA", "MP", "ST"];

static ISO_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| ISO_COUNTRY_CODES.iter().copied().collect());

static ALIAS_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| REGION_ALIASES.iter().copied().collect());

/// Media format tokens (lowercase) and the tag they normalize to.
const MEDIA_FORMATS: &[(&str, &str)] = &[
    ("vinyl", "Vinyl"),
    ("vls", "Vinyl"),
    ("cd", "CD"),
    ("cdm", "CD"),
    ("cds", "CD"),
    ("cdr", "CD"),
    ("cdep", "CD"),
    ("mcd", "CD"),
    ("dvd", "DVD"),
    ("dvda", "DVD"),
    ("tape", "Cassette"),
    ("cassette", "Cassette"),
    ("mc", "Cassette"),
    ("web", "File"),
    ("digital", "File"),
];

/// Distribution and rip vocabulary (lowercase) and the tag it normalizes to.
const DISTRIBUTION_TAGS: &[(&str, &str)] = &[
    ("limited", "Limited Edition"),
    ("ltd", "Limited Edition"),
    ("remastered", "Remastered"),
    ("remaster", "Remastered"),
    ("reissue", "Reissue"),
    ("repress", "Reissue"),
    ("promo", "Promo"),
    ("bootleg", "Bootleg"),
    ("advance", "Advance"),
    ("proper", "Proper"),
    ("rerip", "Rerip"),
    ("retail", "Retail"),
    ("sampler", "Sampler"),
    ("remix", "Remix"),
    ("remixes", "Remix"),
    ("bonus", "Bonus"),
    ("bonustracks", "Bonus"),
    ("demo", "Demo"),
    ("single", "Single"),
    ("cdm", "Single"),
    ("cds", "Single"),
    ("ep", "EP"),
    ("cdep", "EP"),
    ("lp", "LP"),
    ("ost", "Soundtrack"),
    ("flac", "FLAC"),
];

static MEDIA_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| MEDIA_FORMATS.iter().copied().collect());

static DISTRIBUTION_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| DISTRIBUTION_TAGS.iter().copied().collect());

/// `2CD`, `3xLP`, `4DVD` and friends.
static MULTI_DISC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^([0-9]{1,2})x?(cd|lp|dvd)$").unwrap());

/// Tokens discarded when splitting a name into artists.
const RESERVED_ARTIST_TOKENS: &[&str] = &["split", "ep", "vinyl", "cd", "web", "lp", "va", "and", "vs", "vs.", "with", "&", "n"];

/// Normalize a region token: ISO codes pass through, aliases are mapped, anything else is not a
/// region. Only uppercase tokens qualify; `de` in a title is a word, `DE` is Germany.
pub fn normalize_region(token: &str) -> Option<&'static str> {
    if token.len() != 2 || !token.bytes().all(|b| b.is_ascii_uppercase()) || NOT_REGIONS.contains(&token) {
        return None;
    }
    if let Some(iso) = ALIAS_MAP.get(token) {
        return Some(*iso);
    }
    ISO_SET.get(token).copied()
}

pub fn media_format(token: &str) -> Option<&'static str> {
    let lower = token.to_lowercase();
    if let Some(tag) = MEDIA_MAP.get(lower.as_str()) {
        return Some(*tag);
    }
    let caps = MULTI_DISC_REGEX.captures(&lower)?;
    match &caps[2] {
        "cd" => Some("CD"),
        "lp" => Some("Vinyl"),
        "dvd" => Some("DVD"),
        _ => None,
    }
}

pub fn distribution_tag(token: &str) -> Option<&'static str> {
    DISTRIBUTION_MAP.get(token.to_lowercase().as_str()).copied()
}

/// Multi-disc count tag such as `2CD`, normalized to uppercase without the `x`.
pub fn multi_disc_tag(token: &str) -> Option<String> {
    let caps = MULTI_DISC_REGEX.captures(token)?;
    let count: u32 = caps[1].parse().ok()?;
    if count < 2 {
        return None;
    }
    Some(format!("{}{}", count, caps[2].to_uppercase()))
}

pub fn is_reserved_artist_token(token: &str) -> bool {
    let lower = token.trim().to_lowercase();
    RESERVED_ARTIST_TOKENS.contains(&lower.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_region() {
        assert_eq!(normalize_region("US"), Some("US"));
        assert_eq!(normalize_region("DE"), Some("DE"));
        assert_eq!(normalize_region("SP"), Some("ES"));
        assert_eq!(normalize_region("UK"), Some("GB"));
        assert_eq!(normalize_region("EN"), Some("GB"));
        assert_eq!(normalize_region("de"), None);
        assert_eq!(normalize_region("CD"), None);
        assert_eq!(normalize_region("EP"), None);
        assert_eq!(normalize_region("II"), None);
        assert_eq!(normalize_region("USA"), None);
    }

    #[test]
    fn test_media_format() {
        assert_eq!(media_format("VINYL"), Some("Vinyl"));
        assert_eq!(media_format("vls"), Some("Vinyl"));
        assert_eq!(media_format("CDM"), Some("CD"));
        assert_eq!(media_format("2CD"), Some("CD"));
        assert_eq!(media_format("3xLP"), Some("Vinyl"));
        assert_eq!(media_format("WEB"), Some("File"));
        assert_eq!(media_format("tape"), Some("Cassette"));
        assert_eq!(media_format("DVDA"), Some("DVD"));
        assert_eq!(media_format("Title"), None);
    }

    #[test]
    fn test_multi_disc_tag() {
        assert_eq!(multi_disc_tag("2CD").as_deref(), Some("2CD"));
        assert_eq!(multi_disc_tag("3xlp").as_deref(), Some("3LP"));
        assert_eq!(multi_disc_tag("1CD"), None);
        assert_eq!(multi_disc_tag("CD"), None);
    }

    #[test]
    fn test_distribution_tag() {
        assert_eq!(distribution_tag("LTD"), Some("Limited Edition"));
        assert_eq!(distribution_tag("Promo"), Some("Promo"));
        assert_eq!(distribution_tag("REMASTERED"), Some("Remastered"));
        assert_eq!(distribution_tag("Bonustracks"), Some("Bonus"));
        assert_eq!(distribution_tag("Album"), None);
    }

    #[test]
    fn test_reserved_artist_tokens() {
        assert!(is_reserved_artist_token("Split"));
        assert!(is_reserved_artist_token(" and "));
        assert!(is_reserved_artist_token("CD"));
        assert!(!is_reserved_artist_token("Converge"));
    }
}
