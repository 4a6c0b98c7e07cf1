use std::collections::BTreeMap;

/// Well known environment keys that stores give special treatment to
pub mod keys {
    pub const MANUFACTURER: &str = "manufacturer";
    pub const MODEL: &str = "model";
    pub const OS_VERSION: &str = "os_version";
    pub const APP_VERSION: &str = "app_version";

    /// All of the well known keys, in the order they are presented
    pub const WELL_KNOWN: [&str; 4] = [MANUFACTURER, MODEL, OS_VERSION, APP_VERSION];
}

/// Free-form string metadata describing the environment a fault happened in,
/// eg. the app version, the OS version or the device model
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Environment {
    entries: BTreeMap<String, String>,
}

impl Environment {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder style [`Self::insert`]
    #[inline]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    #[inline]
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    #[inline]
    pub fn manufacturer(&self) -> Option<&str> {
        self.get(keys::MANUFACTURER)
    }

    #[inline]
    pub fn model(&self) -> Option<&str> {
        self.get(keys::MODEL)
    }

    #[inline]
    pub fn os_version(&self) -> Option<&str> {
        self.get(keys::OS_VERSION)
    }

    #[inline]
    pub fn app_version(&self) -> Option<&str> {
        self.get(keys::APP_VERSION)
    }

    /// Entries that are not one of the [`keys::WELL_KNOWN`] keys, ordered by key
    pub fn extra(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.iter().filter(|(k, _)| !keys::WELL_KNOWN.contains(k))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Environment
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
