#![forbid(unsafe_code)]

//! User-tunable options.
//!
//! Options are read once at startup, either from JSON text or from an
//! [`OptionSource`] (the synchronous key/value store the host exposes).
//! Every key is validated on its own: a malformed value logs a warning and
//! falls back to that key's default without disturbing the others.
//!
//! Key names are camelCase to match what the options page stores.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use web_time::Duration;

use crate::error::{Error, Result};
use crate::intent::{Intent, Tab, TimeRange};
use crate::keybinding::{DEFAULT_SEQUENCE_TIMEOUT_MS, KeyBinding};

/// Synchronous key/value read access to stored options.
pub trait OptionSource {
    /// Raw stored value for `name`, if any.
    fn get(&self, name: &str) -> Option<Value>;
}

impl OptionSource for Map<String, Value> {
    fn get(&self, name: &str) -> Option<Value> {
        Map::get(self, name).cloned()
    }
}

impl<T: OptionSource + ?Sized> OptionSource for &T {
    fn get(&self, name: &str) -> Option<Value> {
        (**self).get(name)
    }
}

/// Complete option record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Highlight the first result as soon as the list is built.
    pub auto_select_first: bool,
    /// Wrap from last to first (and first to last) when moving.
    pub wrap_navigation: bool,
    /// Suppress the browser focus outline on highlighted anchors.
    pub hide_outline: bool,
    /// Startup settle time in milliseconds.
    pub delay: u64,
    /// Window between the chords of a multi-key binding, in milliseconds.
    pub sequence_timeout: u64,
    #[serde(flatten)]
    pub keys: KeyBindingOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            auto_select_first: true,
            wrap_navigation: false,
            hide_outline: false,
            delay: 0,
            sequence_timeout: DEFAULT_SEQUENCE_TIMEOUT_MS,
            keys: KeyBindingOptions::default(),
        }
    }
}

/// Binding strings per intent. Each field holds alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeyBindingOptions {
    pub next_key: Vec<String>,
    pub previous_key: Vec<String>,
    pub navigate_key: Vec<String>,
    pub navigate_new_tab_key: Vec<String>,
    pub navigate_new_tab_background_key: Vec<String>,
    pub focus_search_input: Vec<String>,
    pub navigate_search_tab: Vec<String>,
    pub navigate_images_tab: Vec<String>,
    pub navigate_videos_tab: Vec<String>,
    pub navigate_maps_tab: Vec<String>,
    pub navigate_news_tab: Vec<String>,
    pub navigate_shopping_tab: Vec<String>,
    pub navigate_books_tab: Vec<String>,
    pub navigate_flights_tab: Vec<String>,
    pub navigate_financial_tab: Vec<String>,
    pub navigate_previous_result_page: Vec<String>,
    pub navigate_next_result_page: Vec<String>,
    pub navigate_show_all: Vec<String>,
    pub navigate_show_hour: Vec<String>,
    pub navigate_show_day: Vec<String>,
    pub navigate_show_week: Vec<String>,
    pub navigate_show_month: Vec<String>,
    pub navigate_show_year: Vec<String>,
    pub toggle_verbatim_search: Vec<String>,
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_owned()).collect()
}

impl Default for KeyBindingOptions {
    fn default() -> Self {
        Self {
            next_key: keys(&["down", "j"]),
            previous_key: keys(&["up", "k"]),
            navigate_key: keys(&["return", "space"]),
            navigate_new_tab_key: keys(&["ctrl+return", "command+return", "o"]),
            navigate_new_tab_background_key: keys(&["ctrl+shift+return", "command+shift+return"]),
            focus_search_input: keys(&["/", "escape"]),
            navigate_search_tab: keys(&["a", "s"]),
            navigate_images_tab: keys(&["i"]),
            navigate_videos_tab: keys(&["v"]),
            navigate_maps_tab: keys(&["m"]),
            navigate_news_tab: keys(&["n"]),
            navigate_shopping_tab: keys(&["alt+s"]),
            navigate_books_tab: keys(&["b"]),
            navigate_flights_tab: keys(&["alt+l"]),
            navigate_financial_tab: keys(&["f"]),
            navigate_previous_result_page: keys(&["left", "h"]),
            navigate_next_result_page: keys(&["right", "l"]),
            navigate_show_all: keys(&["z a"]),
            navigate_show_hour: keys(&["z h"]),
            navigate_show_day: keys(&["z d"]),
            navigate_show_week: keys(&["z w"]),
            navigate_show_month: keys(&["z m"]),
            navigate_show_year: keys(&["z y"]),
            toggle_verbatim_search: keys(&["z v"]),
        }
    }
}

impl KeyBindingOptions {
    /// `(option name, binding strings, intent)` for every bindable intent.
    fn table(&self) -> [(&'static str, &[String], Intent); 24] {
        [
            ("nextKey", &self.next_key, Intent::FocusNext),
            ("previousKey", &self.previous_key, Intent::FocusPrevious),
            ("navigateKey", &self.navigate_key, Intent::Navigate),
            ("navigateNewTabKey", &self.navigate_new_tab_key, Intent::NavigateNewTab),
            (
                "navigateNewTabBackgroundKey",
                &self.navigate_new_tab_background_key,
                Intent::NavigateNewTabBackground,
            ),
            ("focusSearchInput", &self.focus_search_input, Intent::FocusSearchBox),
            ("navigateSearchTab", &self.navigate_search_tab, Intent::SwitchTab(Tab::All)),
            ("navigateImagesTab", &self.navigate_images_tab, Intent::SwitchTab(Tab::Images)),
            ("navigateVideosTab", &self.navigate_videos_tab, Intent::SwitchTab(Tab::Videos)),
            ("navigateMapsTab", &self.navigate_maps_tab, Intent::SwitchTab(Tab::Maps)),
            ("navigateNewsTab", &self.navigate_news_tab, Intent::SwitchTab(Tab::News)),
            ("navigateShoppingTab", &self.navigate_shopping_tab, Intent::SwitchTab(Tab::Shopping)),
            ("navigateBooksTab", &self.navigate_books_tab, Intent::SwitchTab(Tab::Books)),
            ("navigateFlightsTab", &self.navigate_flights_tab, Intent::SwitchTab(Tab::Flights)),
            (
                "navigateFinancialTab",
                &self.navigate_financial_tab,
                Intent::SwitchTab(Tab::Financial),
            ),
            (
                "navigatePreviousResultPage",
                &self.navigate_previous_result_page,
                Intent::SwitchTab(Tab::PreviousPage),
            ),
            (
                "navigateNextResultPage",
                &self.navigate_next_result_page,
                Intent::SwitchTab(Tab::NextPage),
            ),
            ("navigateShowAll", &self.navigate_show_all, Intent::ChangeTools(TimeRange::Any)),
            ("navigateShowHour", &self.navigate_show_hour, Intent::ChangeTools(TimeRange::Hour)),
            ("navigateShowDay", &self.navigate_show_day, Intent::ChangeTools(TimeRange::Day)),
            ("navigateShowWeek", &self.navigate_show_week, Intent::ChangeTools(TimeRange::Week)),
            ("navigateShowMonth", &self.navigate_show_month, Intent::ChangeTools(TimeRange::Month)),
            ("navigateShowYear", &self.navigate_show_year, Intent::ChangeTools(TimeRange::Year)),
            (
                "toggleVerbatimSearch",
                &self.toggle_verbatim_search,
                Intent::ChangeTools(TimeRange::Verbatim),
            ),
        ]
    }
}

impl Options {
    /// Parse options from JSON text.
    ///
    /// Only a syntax error (or a non-object document) fails; individual bad
    /// values fall back to their defaults as in [`from_source`](Self::from_source).
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        match value {
            Value::Object(map) => Ok(Self::from_source(&map)),
            other => Err(Error::InvalidOption {
                name: "<root>".to_owned(),
                reason: format!("expected an object, found {}", json_kind(&other)),
            }),
        }
    }

    /// Read every known key from `source`, validating each independently.
    pub fn from_source(source: &impl OptionSource) -> Self {
        let defaults = Self::default();
        let Ok(Value::Object(mut merged)) = serde_json::to_value(&defaults) else {
            return defaults;
        };

        let names: Vec<String> = merged.keys().cloned().collect();
        for name in names {
            let Some(value) = source.get(&name) else {
                continue;
            };
            let mut candidate = merged.clone();
            candidate.insert(name.clone(), value);
            match serde_json::from_value::<Self>(Value::Object(candidate.clone())) {
                Ok(_) => merged = candidate,
                Err(err) => {
                    let err = Error::InvalidOption {
                        name,
                        reason: err.to_string(),
                    };
                    tracing::warn!(message = "options.invalid", error = %err);
                }
            }
        }

        serde_json::from_value(Value::Object(merged)).unwrap_or_else(|err| {
            tracing::warn!(message = "options.invalid", error = %err);
            defaults
        })
    }

    /// Startup settle time.
    #[must_use]
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.delay)
    }

    /// Multi-key sequence window.
    #[must_use]
    pub fn sequence_timeout(&self) -> Duration {
        Duration::from_millis(self.sequence_timeout)
    }

    /// Parsed bindings in declaration order.
    ///
    /// Binding strings that fail to parse are skipped with a warning.
    #[must_use]
    pub fn bindings(&self) -> Vec<(KeyBinding, Intent)> {
        let mut out = Vec::new();
        for (name, texts, intent) in self.keys.table() {
            for text in texts {
                match KeyBinding::parse(text) {
                    Ok(binding) => out.push((binding, intent)),
                    Err(err) => {
                        tracing::warn!(message = "options.binding_skipped", option = name, error = %err);
                    }
                }
            }
        }
        out
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
