//! Effect parameter compositing.
//!
//! An element may carry several effect entries (one per applied preset or slider group). The
//! compositor folds the enabled ones into a single parameter map and translates that map into a
//! renderer-facing filter chain.
//!
//! Merge policy is **last-write-wins per key**, left to right. It is not additive: two entries
//! that both set `brightness` yield the later value, never the sum.

use std::collections::BTreeMap;

/// One effect entry attached to an element.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EffectEntry {
    /// Disabled entries are ignored by [`merge_effects`].
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Numeric parameters keyed by name.
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
}

fn default_enabled() -> bool {
    true
}

impl EffectEntry {
    /// Enabled entry with the given parameters.
    pub fn enabled<K: Into<String>>(params: impl IntoIterator<Item = (K, f64)>) -> Self {
        Self {
            enabled: true,
            parameters: params.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Disabled entry with the given parameters.
    pub fn disabled<K: Into<String>>(params: impl IntoIterator<Item = (K, f64)>) -> Self {
        Self {
            enabled: false,
            ..Self::enabled(params)
        }
    }
}

/// Ordered per-element effect list as returned by the effects registry.
pub type EffectSet = Vec<EffectEntry>;

/// Result of merging an [`EffectSet`].
#[derive(Clone, Debug, Default, PartialEq)]
pub enum FilterSpec {
    /// No enabled entries.
    #[default]
    NoEffect,
    /// Folded parameter map.
    Params(BTreeMap<String, f64>),
}

/// Fold enabled entries left to right, later keys overriding earlier ones.
///
/// Returns [`FilterSpec::NoEffect`] when the set is empty or fully disabled.
pub fn merge_effects(effects: &[EffectEntry]) -> FilterSpec {
    let mut enabled = effects.iter().filter(|e| e.enabled).peekable();
    if enabled.peek().is_none() {
        return FilterSpec::NoEffect;
    }

    let mut merged = BTreeMap::new();
    for entry in enabled {
        for (key, value) in &entry.parameters {
            merged.insert(key.clone(), *value);
        }
    }
    FilterSpec::Params(merged)
}

/// Renderer-facing filter operation.
///
/// Amounts use CSS filter units: multipliers for brightness/contrast/saturate, fractions in
/// `[0, 1]` for grayscale/sepia/invert/opacity, degrees for hue rotation and pixels for blur.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterOp {
    /// Linear brightness multiplier.
    Brightness(f64),
    /// Contrast multiplier around mid-gray.
    Contrast(f64),
    /// Saturation multiplier.
    Saturate(f64),
    /// Hue rotation in degrees.
    HueRotate(f64),
    /// Gaussian blur radius in pixels.
    Blur(f64),
    /// Grayscale amount.
    Grayscale(f64),
    /// Sepia amount.
    Sepia(f64),
    /// Inversion amount.
    Invert(f64),
    /// Alpha multiplier.
    Opacity(f64),
}

impl FilterOp {
    /// Return `true` when applying this op leaves pixels unchanged.
    pub fn is_identity(self) -> bool {
        match self {
            Self::Brightness(v) | Self::Contrast(v) | Self::Saturate(v) | Self::Opacity(v) => {
                v == 1.0
            }
            Self::HueRotate(v) | Self::Blur(v) | Self::Grayscale(v) | Self::Sepia(v)
            | Self::Invert(v) => v == 0.0,
        }
    }

    fn to_css(self) -> String {
        match self {
            Self::Brightness(v) => format!("brightness({})", fmt_num(v)),
            Self::Contrast(v) => format!("contrast({})", fmt_num(v)),
            Self::Saturate(v) => format!("saturate({})", fmt_num(v)),
            Self::HueRotate(v) => format!("hue-rotate({}deg)", fmt_num(v)),
            Self::Blur(v) => format!("blur({}px)", fmt_num(v)),
            Self::Grayscale(v) => format!("grayscale({})", fmt_num(v)),
            Self::Sepia(v) => format!("sepia({})", fmt_num(v)),
            Self::Invert(v) => format!("invert({})", fmt_num(v)),
            Self::Opacity(v) => format!("opacity({})", fmt_num(v)),
        }
    }
}

fn fmt_num(v: f64) -> String {
    let rounded = (v * 1000.0).round() / 1000.0;
    format!("{rounded}")
}

/// Parameter keys understood by [`FilterSpec::filter_ops`], in application order.
///
/// Slider keys (`brightness`, `contrast`, `saturation`) are percentages in `[-100, 100]` around
/// the neutral value; `hue` is degrees; `blur` is pixels; `grayscale`, `sepia`, `invert` and
/// `opacity` are percentages in `[0, 100]`.
pub const FILTER_KEYS: [&str; 9] = [
    "brightness",
    "contrast",
    "saturation",
    "hue",
    "blur",
    "grayscale",
    "sepia",
    "invert",
    "opacity",
];

impl FilterSpec {
    /// Return `true` for [`FilterSpec::NoEffect`].
    pub fn is_none(&self) -> bool {
        matches!(self, Self::NoEffect)
    }

    /// Merged value for a key, if present.
    pub fn param(&self, key: &str) -> Option<f64> {
        match self {
            Self::NoEffect => None,
            Self::Params(p) => p.get(key).copied(),
        }
    }

    /// Translate the merged map into filter ops in canonical order.
    ///
    /// Unknown keys and non-finite values are skipped; identity ops are dropped.
    pub fn filter_ops(&self) -> Vec<FilterOp> {
        let Self::Params(params) = self else {
            return Vec::new();
        };

        for key in params.keys() {
            if !FILTER_KEYS.contains(&key.as_str()) {
                tracing::debug!(key = %key, "ignoring unknown effect parameter");
            }
        }

        let mut ops = Vec::new();
        for key in FILTER_KEYS {
            let Some(&v) = params.get(key) else {
                continue;
            };
            if !v.is_finite() {
                continue;
            }
            let op = match key {
                "brightness" => FilterOp::Brightness((1.0 + v / 100.0).max(0.0)),
                "contrast" => FilterOp::Contrast((1.0 + v / 100.0).max(0.0)),
                "saturation" => FilterOp::Saturate((1.0 + v / 100.0).max(0.0)),
                "hue" => FilterOp::HueRotate(v.rem_euclid(360.0)),
                "blur" => FilterOp::Blur(v.max(0.0)),
                "grayscale" => FilterOp::Grayscale((v / 100.0).clamp(0.0, 1.0)),
                "sepia" => FilterOp::Sepia((v / 100.0).clamp(0.0, 1.0)),
                "invert" => FilterOp::Invert((v / 100.0).clamp(0.0, 1.0)),
                "opacity" => FilterOp::Opacity((v / 100.0).clamp(0.0, 1.0)),
                _ => continue,
            };
            if !op.is_identity() {
                ops.push(op);
            }
        }
        ops
    }

    /// CSS `filter` expression, or `"none"`.
    pub fn to_css(&self) -> String {
        let ops = self.filter_ops();
        if ops.is_empty() {
            return "none".to_string();
        }
        ops.into_iter()
            .map(FilterOp::to_css)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/merge.rs"]
mod tests;
