use std::{collections::HashSet, fmt, sync::Arc};

/// Default `strftime` layout for timestamps rendered as strings.
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default bound on the nesting depth of a single conversion.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Which naming convention decides a field's external key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Naming {
    /// The declared Rust field name, untouched.
    Declared,
    /// Only `#[facet(json = "...")]` annotations.
    Json,
    /// Only `#[facet(gorm = "...")]` annotations.
    Gorm,
    /// Only `#[facet(xorm = "...")]` annotations.
    Xorm,
    /// `json`, then `gorm`, then `xorm`, then the small-camel declared name.
    #[default]
    Cascade,
}

/// How timestamps are represented in the generic tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRepr {
    /// A string formatted with [`Options::time_format`].
    #[default]
    String,
    /// Unix seconds.
    Numeric,
}

/// Receives a trace line for every step of a conversion.
///
/// Any `Fn(usize, &str) + Send + Sync` closure is a sink; the first argument
/// is the nesting depth of the step.
pub trait DiagnosticSink: Send + Sync {
    /// Record one step.
    fn record(&self, depth: usize, message: &str);
}

impl<F> DiagnosticSink for F
where
    F: Fn(usize, &str) + Send + Sync,
{
    fn record(&self, depth: usize, message: &str) {
        self(depth, message)
    }
}

/// Options for a single conversion.
///
/// Built by value and never mutated once a conversion starts, so one
/// `Options` can be shared by concurrent callers.
///
/// ```
/// use facet_deepcopy::{Naming, Options, TimeRepr};
///
/// let options = Options::new()
///     .naming(Naming::Json)
///     .omit_empty(true)
///     .time_repr(TimeRepr::Numeric)
///     .exclude(["password"]);
/// assert!(options.is_excluded("PASSWORD"));
/// ```
#[derive(Clone)]
pub struct Options {
    pub(crate) naming: Naming,
    pub(crate) omit_empty: bool,
    pub(crate) time_format: String,
    pub(crate) time_repr: TimeRepr,
    pub(crate) excluded: HashSet<String>,
    pub(crate) max_depth: usize,
    pub(crate) sink: Option<Arc<dyn DiagnosticSink>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            naming: Naming::default(),
            omit_empty: false,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            time_repr: TimeRepr::default(),
            excluded: HashSet::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            sink: None,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("naming", &self.naming)
            .field("omit_empty", &self.omit_empty)
            .field("time_format", &self.time_format)
            .field("time_repr", &self.time_repr)
            .field("excluded", &self.excluded)
            .field("max_depth", &self.max_depth)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl Options {
    /// Default options: cascade naming, no omission, string timestamps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the naming convention.
    pub fn naming(mut self, naming: Naming) -> Self {
        self.naming = naming;
        self
    }

    /// Omit zero-valued fields when encoding.
    pub fn omit_empty(mut self, omit_empty: bool) -> Self {
        self.omit_empty = omit_empty;
        self
    }

    /// Set the `strftime` layout used for string timestamps.
    pub fn time_format(mut self, layout: impl Into<String>) -> Self {
        self.time_format = layout.into();
        self
    }

    /// Choose between string and numeric timestamps.
    pub fn time_repr(mut self, repr: TimeRepr) -> Self {
        self.time_repr = repr;
        self
    }

    /// Exclude fields by resolved key, compared case-insensitively.
    pub fn exclude<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded
            .extend(keys.into_iter().map(|k| k.as_ref().to_lowercase()));
        self
    }

    /// Bound the nesting depth of a conversion.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Route per-step trace lines to `sink`.
    pub fn diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Whether `key` is in the exclusion set.
    pub fn is_excluded(&self, key: &str) -> bool {
        !self.excluded.is_empty() && self.excluded.contains(&key.to_lowercase())
    }

    /// The naming convention in effect.
    pub fn naming_mode(&self) -> Naming {
        self.naming
    }

    /// Options that keep every field under its declared name, with a
    /// lossless timestamp layout. Used to snapshot a value before rebuilding
    /// it.
    pub(crate) fn snapshot(&self) -> Self {
        Self {
            naming: Naming::Declared,
            omit_empty: false,
            time_format: "%+".to_string(),
            time_repr: TimeRepr::String,
            excluded: HashSet::new(),
            max_depth: self.max_depth,
            sink: self.sink.clone(),
        }
    }

    pub(crate) fn trace(&self, depth: usize, message: impl FnOnce() -> String) {
        if log::log_enabled!(log::Level::Trace) || self.sink.is_some() {
            let message = message();
            log::trace!("{}{}", "    ".repeat(depth), message);
            if let Some(sink) = &self.sink {
                sink.record(depth, &message);
            }
        }
    }
}
