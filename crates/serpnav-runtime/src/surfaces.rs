#![forbid(unsafe_code)]

//! Selector-driven search surfaces.
//!
//! Each supported search surface is described by a [`SurfaceProfile`]: plain
//! data (selectors, URL pattern, query parameters) interpreted by one generic
//! adapter, [`SelectorSource`]. Profiles can be loaded from JSON, so adding a
//! surface does not require new code.
//!
//! [`SurfaceRegistry::detect`] picks the profile whose URL pattern matches
//! the current page. When nothing matches, navigation stays inert.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serpnav_core::{Error, Result, Tab, TimeRange};
use url::Url;

use crate::page::Page;
use crate::result::ResultRecord;
use crate::source::{ChangeKind, ChangeWatch, ResultSource};

/// Default CSS class applied to the highlighted result.
pub const DEFAULT_HIGHLIGHT_CLASS: &str = "serpnav-focused";

/// Which element of a result receives the highlight class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HighlightTarget {
    #[default]
    Container,
    Anchor,
}

/// Query parameter a surface uses for time-range filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeParam {
    /// Parameter name (`tbs`, `df`, ...).
    pub name: String,
    /// Parameter value per range. A range without an entry is unsupported;
    /// [`TimeRange::Any`] always clears the range.
    #[serde(default)]
    pub values: BTreeMap<TimeRange, String>,
    /// Ranges whose value is a flag switched on and off next to the current
    /// range instead of replacing it (verbatim search).
    #[serde(default)]
    pub toggles: BTreeSet<TimeRange>,
    /// Separator between entries when the parameter carries several.
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_separator() -> String {
    ",".to_owned()
}

impl TimeParam {
    #[must_use]
    pub fn supports(&self, range: TimeRange) -> bool {
        range == TimeRange::Any || self.values.contains_key(&range)
    }

    /// Parameter value after applying `range` to `current`. `None` means the
    /// parameter should be removed.
    ///
    /// A range replaces any other range entry and keeps flags and unknown
    /// entries; a toggle adds or removes its own entry.
    #[must_use]
    pub fn apply(&self, current: Option<&str>, range: TimeRange) -> Option<String> {
        let mut entries: Vec<&str> = current
            .map(|value| {
                value
                    .split(self.separator.as_str())
                    .filter(|entry| !entry.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        if self.toggles.contains(&range) {
            if let Some(flag) = self.values.get(&range) {
                let before = entries.len();
                entries.retain(|entry| *entry != flag.as_str());
                if entries.len() == before {
                    entries.push(flag);
                }
            }
        } else {
            let ranges: Vec<&str> = self
                .values
                .iter()
                .filter(|(r, _)| !self.toggles.contains(*r))
                .map(|(_, value)| value.as_str())
                .collect();
            entries.retain(|entry| !ranges.contains(entry));
            if let Some(value) = self.values.get(&range) {
                entries.insert(0, value);
            }
        }

        (!entries.is_empty()).then(|| entries.join(self.separator.as_str()))
    }
}

fn default_highlight_class() -> String {
    DEFAULT_HIGHLIGHT_CLASS.to_owned()
}

/// Declarative description of one search surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceProfile {
    pub name: String,
    /// Regular expression matched against the full page address.
    pub url_pattern: String,
    /// Selector for result containers.
    pub result_selector: String,
    /// Selector (within a container) for the primary link.
    pub anchor_selector: String,
    #[serde(default)]
    pub highlight: HighlightTarget,
    #[serde(default = "default_highlight_class")]
    pub highlight_class: String,
    pub search_box_selector: String,
    /// Fixed header whose height is reserved at the top of the viewport.
    #[serde(default)]
    pub header_selector: Option<String>,
    #[serde(default)]
    pub bottom_overlay: bool,
    #[serde(default)]
    pub change_watch: Option<ChangeWatch>,
    #[serde(default)]
    pub tabs: BTreeMap<Tab, String>,
    #[serde(default)]
    pub time_param: Option<TimeParam>,
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// [`ResultSource`] driven by a [`SurfaceProfile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSource {
    profile: SurfaceProfile,
}

impl SelectorSource {
    #[must_use]
    pub fn new(profile: SurfaceProfile) -> Self {
        Self { profile }
    }

    #[must_use]
    pub fn profile(&self) -> &SurfaceProfile {
        &self.profile
    }
}

impl<P: Page> ResultSource<P> for SelectorSource {
    fn name(&self) -> &str {
        &self.profile.name
    }

    fn results(&self, page: &P) -> Vec<ResultRecord<P::Element>> {
        let mut records: Vec<ResultRecord<P::Element>> = Vec::new();
        for container in page.query_all(&self.profile.result_selector) {
            let Some(anchor) = page
                .query_within(&container, &self.profile.anchor_selector)
                .into_iter()
                .next()
            else {
                continue;
            };
            // Nested containers resolve to the same link; keep the outermost.
            if records.iter().any(|r| r.anchor == anchor) {
                continue;
            }
            let highlighted = match self.profile.highlight {
                HighlightTarget::Container => container.clone(),
                HighlightTarget::Anchor => anchor.clone(),
            };
            records.push(ResultRecord {
                container,
                anchor,
                highlighted,
                highlight_class: self.profile.highlight_class.clone(),
            });
        }
        records
    }

    fn top_margin(&self, page: &P, _element: &P::Element) -> f64 {
        self.profile
            .header_selector
            .as_deref()
            .and_then(|selector| page.query_first(selector))
            .map_or(0.0, |header| page.bounding_rect(&header).height)
    }

    fn bottom_overlay(&self) -> bool {
        self.profile.bottom_overlay
    }

    fn change_watch(&self) -> Option<ChangeWatch> {
        self.profile.change_watch.clone()
    }

    fn search_box_selector(&self) -> &str {
        &self.profile.search_box_selector
    }

    fn tab_target(&self, page: &P, tab: Tab) -> Option<P::Element> {
        let selector = self.profile.tabs.get(&tab)?;
        page.query_first(selector)
    }

    fn change_tools(&self, page: &P, range: Option<TimeRange>) -> bool {
        let Some(param) = &self.profile.time_param else {
            return false;
        };
        let range = range.unwrap_or(TimeRange::Any);
        if !param.supports(range) {
            return false;
        }

        let current = page.current_url();
        let value = param.apply(query_param(&current, &param.name).as_deref(), range);
        match with_query_param(&current, &param.name, value.as_deref()) {
            Ok(next) => {
                if next != current {
                    page.navigate_to(&next);
                }
                true
            }
            Err(err) => {
                tracing::warn!(message = "surfaces.bad_url", url = %current, error = %err);
                false
            }
        }
    }
}

/// Decoded value of the first `name` parameter of `url`.
#[must_use]
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Replace (or, with `None`, remove) every `name` parameter of `url`.
///
/// Names are compared decoded. Other parameters keep their order and the
/// fragment is kept; the query is re-serialized with form encoding.
pub fn with_query_param(
    url: &str,
    name: &str,
    value: Option<&str>,
) -> std::result::Result<String, url::ParseError> {
    let mut parsed = Url::parse(url)?;
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| key != name)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() && value.is_none() {
        parsed.set_query(None);
    } else {
        let mut pairs = parsed.query_pairs_mut();
        pairs.clear();
        for (key, kept_value) in &kept {
            pairs.append_pair(key, kept_value);
        }
        if let Some(value) = value {
            pairs.append_pair(name, value);
        }
    }
    Ok(parsed.into())
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Known surfaces, matched by URL.
#[derive(Debug, Clone, Default)]
pub struct SurfaceRegistry {
    surfaces: Vec<(Regex, SurfaceProfile)>,
}

impl SurfaceRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in profiles.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for profile in builtin_profiles() {
            if let Err(err) = registry.register(profile) {
                tracing::warn!(message = "surfaces.builtin_invalid", error = %err);
            }
        }
        registry
    }

    /// Parse a JSON array of profiles.
    pub fn from_json(text: &str) -> Result<Self> {
        let profiles: Vec<SurfaceProfile> = serde_json::from_str(text)?;
        let mut registry = Self::new();
        for profile in profiles {
            registry.register(profile)?;
        }
        Ok(registry)
    }

    /// Move every profile of `other` after this registry's own.
    pub fn append(&mut self, mut other: SurfaceRegistry) {
        self.surfaces.append(&mut other.surfaces);
    }

    /// Add a profile. Earlier registrations win when patterns overlap.
    pub fn register(&mut self, profile: SurfaceProfile) -> Result<()> {
        let pattern = Regex::new(&profile.url_pattern).map_err(|e| Error::InvalidOption {
            name: format!("{}.urlPattern", profile.name),
            reason: e.to_string(),
        })?;
        self.surfaces.push((pattern, profile));
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Adapter for the first profile whose pattern matches `url`.
    #[must_use]
    pub fn detect(&self, url: &str) -> Option<SelectorSource> {
        let found = self
            .surfaces
            .iter()
            .find(|(pattern, _)| pattern.is_match(url))
            .map(|(_, profile)| SelectorSource::new(profile.clone()));
        match &found {
            Some(source) => {
                tracing::debug!(message = "surfaces.detected", surface = %source.profile.name, url);
            }
            None => {
                tracing::debug!(message = "surfaces.none", url);
            }
        }
        found
    }
}

fn tab_map(entries: &[(Tab, &str)]) -> BTreeMap<Tab, String> {
    entries
        .iter()
        .map(|(tab, selector)| (*tab, (*selector).to_owned()))
        .collect()
}

fn time_values(entries: &[(TimeRange, &str)]) -> BTreeMap<TimeRange, String> {
    entries
        .iter()
        .map(|(range, value)| (*range, (*value).to_owned()))
        .collect()
}

fn builtin_profiles() -> Vec<SurfaceProfile> {
    vec![
        SurfaceProfile {
            name: "google".to_owned(),
            url_pattern: r"^https?://(www\.)?google\.[a-z.]+/search".to_owned(),
            result_selector: "#search div.g".to_owned(),
            anchor_selector: "a[href]".to_owned(),
            highlight: HighlightTarget::Container,
            highlight_class: default_highlight_class(),
            search_box_selector: r#"textarea[name="q"], input[name="q"]"#.to_owned(),
            header_selector: Some("#searchform".to_owned()),
            bottom_overlay: false,
            change_watch: Some(ChangeWatch {
                selector: "#rso".to_owned(),
                kind: ChangeKind::AppendedOnly,
            }),
            tabs: tab_map(&[
                (Tab::All, r#"#hdtb a[href*="/search?"]:not([href*="tbm="])"#),
                (Tab::Images, r#"a[href*="tbm=isch"]"#),
                (Tab::Videos, r#"a[href*="tbm=vid"]"#),
                (Tab::Maps, r#"a[href*="maps.google."]"#),
                (Tab::News, r#"a[href*="tbm=nws"]"#),
                (Tab::Shopping, r#"a[href*="tbm=shop"]"#),
                (Tab::Books, r#"a[href*="tbm=bks"]"#),
                (Tab::Flights, r#"a[href*="/travel/flights"]"#),
                (Tab::Financial, r#"a[href*="/finance"]"#),
                (Tab::PreviousPage, "#pnprev"),
                (Tab::NextPage, "#pnnext"),
            ]),
            time_param: Some(TimeParam {
                name: "tbs".to_owned(),
                values: time_values(&[
                    (TimeRange::Hour, "qdr:h"),
                    (TimeRange::Day, "qdr:d"),
                    (TimeRange::Week, "qdr:w"),
                    (TimeRange::Month, "qdr:m"),
                    (TimeRange::Year, "qdr:y"),
                    (TimeRange::Verbatim, "li:1"),
                ]),
                toggles: BTreeSet::from([TimeRange::Verbatim]),
                separator: default_separator(),
            }),
        },
        SurfaceProfile {
            name: "duckduckgo".to_owned(),
            url_pattern: r"^https?://(www\.)?duckduckgo\.com/".to_owned(),
            result_selector: r#"article[data-testid="result"]"#.to_owned(),
            anchor_selector: r#"a[data-testid="result-title-a"]"#.to_owned(),
            highlight: HighlightTarget::Container,
            highlight_class: default_highlight_class(),
            search_box_selector: r#"input[name="q"]"#.to_owned(),
            header_selector: Some("#header_wrapper".to_owned()),
            bottom_overlay: false,
            change_watch: Some(ChangeWatch {
                selector: ".react-results--main".to_owned(),
                kind: ChangeKind::AppendedOnly,
            }),
            tabs: tab_map(&[
                (Tab::All, r#"a[data-zci-link="web"]"#),
                (Tab::Images, r#"a[data-zci-link="images"]"#),
                (Tab::Videos, r#"a[data-zci-link="videos"]"#),
                (Tab::Maps, r#"a[data-zci-link="maps"]"#),
                (Tab::News, r#"a[data-zci-link="news"]"#),
                (Tab::Shopping, r#"a[data-zci-link="shopping"]"#),
            ]),
            time_param: Some(TimeParam {
                name: "df".to_owned(),
                values: time_values(&[
                    (TimeRange::Day, "d"),
                    (TimeRange::Week, "w"),
                    (TimeRange::Month, "m"),
                    (TimeRange::Year, "y"),
                ]),
                toggles: BTreeSet::new(),
                separator: default_separator(),
            }),
        },
        SurfaceProfile {
            name: "bing".to_owned(),
            url_pattern: r"^https?://(www\.)?bing\.com/search".to_owned(),
            result_selector: "#b_results li.b_algo".to_owned(),
            anchor_selector: "h2 a".to_owned(),
            highlight: HighlightTarget::Container,
            highlight_class: default_highlight_class(),
            search_box_selector: "#sb_form_q".to_owned(),
            header_selector: None,
            bottom_overlay: true,
            change_watch: None,
            tabs: tab_map(&[
                (Tab::All, "#b-scopeListItem-web a"),
                (Tab::Images, "#b-scopeListItem-images a"),
                (Tab::Videos, "#b-scopeListItem-video a"),
                (Tab::Maps, "#b-scopeListItem-local a"),
                (Tab::News, "#b-scopeListItem-news a"),
                (Tab::Shopping, "#b-scopeListItem-shop a"),
                (Tab::PreviousPage, "a.sb_pagP"),
                (Tab::NextPage, "a.sb_pagN"),
            ]),
            time_param: None,
        },
    ]
}
