/// The release_name module parses scene-style release directory names such as
/// `Artist-Title-2023-GROUP` or `VA-Compilation-FLAC-2CD-PROMO-UK-2023-GROUP_INT` into an artist,
/// title, year, label, descriptive tags and a split flag.
///
/// The naming convention is informal, so nothing here fails: every string parses, and what cannot
/// be recovered is left empty (`None` year or label) or approximate (artist/title boundaries).
///
/// Each field is derived by its own small pipeline over the raw name. Cleanup pipelines are ordered
/// lists of [`CleanStep`]s; later steps assume earlier ones already ran, e.g. region codes are
/// stripped while the hyphens around them still exist, before the year and everything after it is
/// cut off.
use crate::common::uniq;
use crate::tag_vocabulary::{distribution_tag, is_reserved_artist_token, media_format, multi_disc_tag, normalize_region};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub const VARIOUS_ARTISTS: &str = "Various Artists";
pub const SELF_TITLED: &str = "Self-Titled";
pub const SPLIT_TAG: &str = "Split";
pub const INTERNAL_TAG: &str = "INT";

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;

/// Everything derived from a single release name. All fields are pure functions of `raw_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseNameInfo {
    pub raw_name: String,
    pub artist: String,
    pub title: String,
    pub year: Option<i32>,
    pub label: Option<String>,
    pub tags: BTreeSet<String>,
    pub is_split: bool,
    pub is_compilation: bool,
}

/// A raw release name with its parsed fields computed on first access.
#[derive(Clone)]
pub struct ReleaseName {
    raw: String,
    info: OnceCell<ReleaseNameInfo>,
}

impl ReleaseName {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            info: OnceCell::new(),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn info(&self) -> &ReleaseNameInfo {
        self.info.get_or_init(|| parse_release_name(&self.raw))
    }

    pub fn into_info(self) -> ReleaseNameInfo {
        match self.info.into_inner() {
            Some(info) => info,
            None => parse_release_name(&self.raw),
        }
    }

    pub fn artist(&self) -> &str {
        &self.info().artist
    }

    pub fn title(&self) -> &str {
        &self.info().title
    }

    pub fn year(&self) -> Option<i32> {
        self.info().year
    }

    pub fn label(&self) -> Option<&str> {
        self.info().label.as_deref()
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.info().tags
    }

    pub fn is_split(&self) -> bool {
        self.info().is_split
    }

    pub fn is_compilation(&self) -> bool {
        self.info().is_compilation
    }
}

impl PartialEq for ReleaseName {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for ReleaseName {}

impl From<&str> for ReleaseName {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Debug for ReleaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReleaseName({:?})", self.raw)
    }
}

impl fmt::Display for ReleaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

pub fn parse_release_name(raw: &str) -> ReleaseNameInfo {
    let is_split = detect_split(raw);
    let label_match = find_label(raw);
    let (artist_part, title_part) = split_candidates(raw, label_match.as_ref());

    let artist_part = strip_featuring(&artist_part);
    let is_compilation = is_compilation_artist(&artist_part);

    let (artist, title) = if is_split {
        let mut artists = extract_artists(&artist_part);
        artists.extend(extract_artists(&title_part));
        let mut artists = uniq(artists);
        if artists.is_empty() {
            artists.push(VARIOUS_ARTISTS.to_string());
        }
        let artist = if is_compilation { VARIOUS_ARTISTS.to_string() } else { artists[0].clone() };
        (artist, artists.join(" / "))
    } else {
        let artist = if is_compilation { VARIOUS_ARTISTS.to_string() } else { clean_artist(&artist_part) };
        (artist, clean_title(&title_part))
    };

    ReleaseNameInfo {
        raw_name: raw.to_string(),
        artist,
        title,
        year: extract_year(raw),
        label: label_match.map(|m| m.label),
        tags: extract_tags(raw, is_split),
        is_split,
        is_compilation,
    }
}

// ---------------------------------------------------------------------------------------------
// Split detection
// ---------------------------------------------------------------------------------------------

static SPLIT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:^|[-_\s])split(?:[-_\s]|$)",
        r"(?i)(?:^|[-_\s])[0-9]+[-_\s]*artists(?:[-_\s]|$)",
        r"(?i)[-_\s]vs\.?[-_\s]",
        r"(?i)[-_\s]with[-_\s]",
        r"(?i)(?:^|[-_\s])and(?:[-_\s]|$)",
        r"__",
        r"[-_\s]&[-_\s]",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

pub fn detect_split(raw: &str) -> bool {
    SPLIT_PATTERNS.iter().any(|re| re.is_match(raw))
}

// ---------------------------------------------------------------------------------------------
// Artist/title boundary
// ---------------------------------------------------------------------------------------------

/// `prefix-middle(-middle)*-YYYY-suffix`, for names whose title has embedded hyphens.
static FOUR_PART_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^-]+)-([^-]+(?:-[^-]+)*)-([0-9]{4})-([^-]+)$").unwrap());

/// Returns the artist candidate and the title candidate.
fn split_candidates(raw: &str, label: Option<&LabelMatch>) -> (String, String) {
    if let Some(caps) = FOUR_PART_REGEX.captures(raw) {
        return (caps[1].to_string(), caps[2].to_string());
    }

    let body = match label.and_then(|m| m.suffix_start) {
        Some(start) => &raw[..start],
        None => raw,
    };
    if let Some((artist, title)) = body.split_once("--") {
        return (artist.to_string(), title.to_string());
    }
    if let Some((artist, title)) = body.split_once('-') {
        return (artist.to_string(), title.to_string());
    }
    (body.to_string(), body.to_string())
}

// ---------------------------------------------------------------------------------------------
// Cleanup pipelines
// ---------------------------------------------------------------------------------------------

enum CleanStep {
    Replace(Regex, &'static str),
    Transform(fn(&str) -> String),
}

impl CleanStep {
    fn re(pattern: &str, replacement: &'static str) -> Self {
        CleanStep::Replace(Regex::new(pattern).unwrap(), replacement)
    }

    fn apply(&self, input: &str) -> String {
        match self {
            CleanStep::Replace(re, replacement) => re.replace_all(input, *replacement).into_owned(),
            CleanStep::Transform(f) => f(input),
        }
    }
}

/// Run `steps` in order. With `keep_nonblank`, a step that would blank out a non-blank input is
/// skipped, so a title made only of scene vocabulary (`EP`, `1984`) survives as itself.
fn run_steps(steps: &[CleanStep], input: &str, keep_nonblank: bool) -> String {
    let mut current = input.to_string();
    for step in steps {
        let next = step.apply(&current);
        if keep_nonblank && next.trim().is_empty() && !current.trim().is_empty() {
            continue;
        }
        current = next;
    }
    current.trim().to_string()
}

/// Drop hyphen-delimited components that are region codes, keeping the first component.
fn strip_region_components(s: &str) -> String {
    let mut parts = s.split('-');
    let mut kept: Vec<&str> = parts.next().into_iter().collect();
    kept.extend(parts.filter(|p| normalize_region(p.trim()).is_none()));
    kept.join("-")
}

static TITLE_STEPS: Lazy<Vec<CleanStep>> = Lazy::new(|| {
    vec![
        // Bracketed catalog numbers and notes.
        CleanStep::re(r"\([^)]*\)?", ""),
        CleanStep::re(r"\[[^\]]*\]?", ""),
        CleanStep::re(r"_+", " "),
        CleanStep::re(r#"(?i)[0-9]+\s*(?:inch(?:es)?|"|”)"#, ""),
        CleanStep::re(r"(?i)\b(?:vinyl|cd|web|tape|digital)\b", ""),
        CleanStep::Transform(strip_region_components),
        // The year and everything after it.
        CleanStep::re(r"-+\s*[0-9]{4}(?:[-\s].*)?$", ""),
        CleanStep::re(r"\b[0-9]{4}\b.*$", ""),
        // Decade placeholders like 198X are not years but end the title all the same.
        CleanStep::re(r"-+\s*[0-9]{3}[Xx](?:[-\s].*)?$", ""),
        CleanStep::re(r"(?i)\b(?:TRACKFIX|DIRFIX|NFOFIX|READ[-\s]*NFO)\b", ""),
        CleanStep::re(r"(?i)\b(?:(?:RE[-\s]*)?(?:MASTERED|ISSUE|PACKAGE|EDITION)|REPRESS)\b", ""),
        CleanStep::re(r"(?i)\b(?:ADVANCE|PROMO|SAMPLER|PROPER|RERIP|RETAIL|REMIX|BONUS(?:TRACKS)?|LIMITED|LTD)\b\.?", ""),
        CleanStep::re(r"(?i)\b(?:CDM[0-9]*|CDEP|CDR|CDS|[0-9]*x?CD|MCD|DVDA|DVD|TAPE|VINYL|VLS|WEB|SAT|CABLE)\b", ""),
        CleanStep::re(r"(?i)\b(?:[0-9]*x?LP|EP|BOOTLEG|SINGLE)\b", ""),
        CleanStep::re(r"(?i)\b(?:FLAC|MP3|320|V0|V2|AAC)\b", ""),
        CleanStep::re(r"(?i)^\s*(?:VA|OST)\b[-\s]*", ""),
        CleanStep::re(r"(?i)\bsplit\b", ""),
        CleanStep::re(r"(?i)^\s*(?:s[-\s.]*t\.?|self[-\s.]*titled)\s*$", SELF_TITLED),
        CleanStep::re(r"\s*-{2,}\s*", "-"),
        CleanStep::re(r"\s+", " "),
        CleanStep::re(r"^[-\s]+|[-\s]+$", ""),
    ]
});

static ARTIST_STEPS: Lazy<Vec<CleanStep>> = Lazy::new(|| {
    vec![
        CleanStep::re(r"_+", " "),
        CleanStep::re(r"\s+", " "),
        CleanStep::re(r"^[-_\s]+|[-_\s]+$", ""),
    ]
});

static FEATURING_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[-_\s(]+(?:feat|ft|featuring|presents)(?:[-_\s.)]|$).*$").unwrap());

static COMPILATION_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(?:va|v\.a\.?|various|various[-_\s]+artists)$").unwrap());

pub fn clean_title(candidate: &str) -> String {
    run_steps(&TITLE_STEPS, candidate, true)
}

pub fn clean_artist(candidate: &str) -> String {
    run_steps(&ARTIST_STEPS, &strip_featuring(candidate), true)
}

fn strip_featuring(candidate: &str) -> String {
    let stripped = FEATURING_REGEX.replace(candidate, "");
    if stripped.trim().is_empty() {
        candidate.to_string()
    } else {
        stripped.into_owned()
    }
}

fn is_compilation_artist(candidate: &str) -> bool {
    COMPILATION_REGEX.is_match(candidate.trim_matches(|c: char| c == '-' || c == '_' || c.is_whitespace()))
}

static UNDERSCORE_RUN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").unwrap());

/// Single underscores are word spaces inside one name; runs of two or more separate names.
fn underscores_to_spaces(part: &str) -> String {
    let part = part.trim_matches(|c: char| c == '_' || c.is_whitespace());
    UNDERSCORE_RUN_REGEX
        .replace_all(part, |caps: &regex::Captures| if caps[0].len() == 1 { " " } else { "__" })
        .into_owned()
}

/// Break a name fragment into artist names: split on `-`, then turn underscores into spaces and
/// split on the connectors ` and `, ` & `, ` vs `, ` with ` and `__`, dropping empty pieces,
/// connector words and format words. Pieces that are only scene vocabulary (years, `VLS`, catalog
/// numbers in brackets) are dropped as well.
pub fn extract_artists(text: &str) -> Vec<String> {
    let mut parts: Vec<String> = text.split('-').map(underscores_to_spaces).filter(|p| !p.is_empty()).collect();
    for sep in [" and ", " & ", " vs ", " with ", "__"] {
        parts = parts
            .into_iter()
            .flat_map(|part| part.split(sep).map(|p| p.trim().to_string()).collect::<Vec<_>>())
            .filter(|p| !p.is_empty())
            .collect();
    }
    parts
        .into_iter()
        .filter(|p| !is_reserved_artist_token(p))
        .map(|p| run_steps(&TITLE_STEPS, &p, false))
        .filter(|p| !p.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------------------------
// Year
// ---------------------------------------------------------------------------------------------

static HYPHEN_YEAR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+([0-9]{4})-+").unwrap());
static BARE_YEAR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([0-9]{4})\b").unwrap());

/// The first hyphen-wrapped four digit number, else the first standalone one. Out of range years
/// are absent rather than clamped, and later candidates are not consulted.
pub fn extract_year(raw: &str) -> Option<i32> {
    let caps = HYPHEN_YEAR_REGEX.captures(raw).or_else(|| BARE_YEAR_REGEX.captures(raw))?;
    let year: i32 = caps[1].parse().ok()?;
    (MIN_YEAR..=MAX_YEAR).contains(&year).then_some(year)
}

// ---------------------------------------------------------------------------------------------
// Label
// ---------------------------------------------------------------------------------------------

static INT_LABEL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-([A-Za-z0-9]+)_INT$").unwrap());
static TRAILING_LABEL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-([A-Za-z0-9]+)$").unwrap());
static FOUR_DIGITS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}$").unwrap());
static AFTER_HYPHEN_YEAR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+[0-9]{4}-+(.*)$").unwrap());
static AFTER_BARE_YEAR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[0-9]{4}\b(.*)$").unwrap());
static INT_SUFFIX_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-_]?INT$").unwrap());

struct LabelMatch {
    label: String,
    /// Byte offset of the `-LABEL` suffix when the label was the trailing token.
    suffix_start: Option<usize>,
}

fn find_label(raw: &str) -> Option<LabelMatch> {
    if let Some(caps) = INT_LABEL_REGEX.captures(raw) {
        return Some(LabelMatch {
            label: caps[1].to_string(),
            suffix_start: caps.get(0).map(|m| m.start()),
        });
    }

    if let Some(caps) = TRAILING_LABEL_REGEX.captures(raw) {
        let components = raw.split('-').filter(|p| !p.is_empty()).count();
        if components >= 3 && !FOUR_DIGITS_REGEX.is_match(&caps[1]) {
            return Some(LabelMatch {
                label: caps[1].to_string(),
                suffix_start: caps.get(0).map(|m| m.start()),
            });
        }
    }

    let caps = AFTER_HYPHEN_YEAR_REGEX.captures(raw).or_else(|| AFTER_BARE_YEAR_REGEX.captures(raw))?;
    let rest = INT_SUFFIX_REGEX.replace(&caps[1], "");
    let label = run_steps(&ARTIST_STEPS, &rest, false);
    if label.is_empty() {
        return None;
    }
    Some(LabelMatch { label, suffix_start: None })
}

/// The release group. `_INT` marks internal releases and is never part of the label.
pub fn extract_label(raw: &str) -> Option<String> {
    find_label(raw).map(|m| m.label)
}

// ---------------------------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------------------------

static INCH_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)([0-9]+)\s*(?:inch(?:es)?|"|”)"#).unwrap());
static TOKEN_SPLIT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-_\s.()\[\]]+").unwrap());

/// Descriptive tags, scanned from the raw name rather than the cleaned title.
pub fn extract_tags(raw: &str, is_split: bool) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();
    if is_split {
        tags.insert(SPLIT_TAG.to_string());
    }

    if let Some(caps) = INCH_REGEX.captures(raw) {
        tags.insert(format!("{}\"", &caps[1]));
    }

    for token in TOKEN_SPLIT_REGEX.split(raw).filter(|t| !t.is_empty()) {
        if let Some(format) = media_format(token) {
            tags.insert(format.to_string());
        }
        if let Some(tag) = distribution_tag(token) {
            tags.insert(tag.to_string());
        }
        if let Some(tag) = multi_disc_tag(token) {
            tags.insert(tag);
        }
    }

    // Region codes only count strictly between hyphens: not the artist, not the group.
    let components: Vec<&str> = raw.split('-').collect();
    if components.len() > 2 {
        for component in &components[1..components.len() - 1] {
            if let Some(region) = normalize_region(component) {
                tags.insert(region.to_string());
            }
        }
    }

    if raw.ends_with("_INT") {
        tags.insert(INTERNAL_TAG.to_string());
    }

    tags
}
