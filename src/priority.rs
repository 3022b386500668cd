//! Traffic classes, the static priority table, and enum-indexed helper tables.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Highest priority level a stream can be assigned.
pub const MAX_PRIORITY: u8 = 2;

/// Priority given to traffic types missing from the table.
pub const DEFAULT_PRIORITY: u8 = 1;

/// Application class a stream carries.
///
/// Labels are the human-readable names used by packet producers ("Voice Call",
/// "YouTube", ...). Anything unrecognised decodes to [`TrafficType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TrafficType {
    Instagram,
    WhatsApp,
    YouTube,
    VoiceCall,
    VideoCall,
    TextMessage,
    VoiceMessage,
    Other,
}

impl TrafficType {
    pub const ALL: [TrafficType; 8] = [
        TrafficType::Instagram,
        TrafficType::WhatsApp,
        TrafficType::YouTube,
        TrafficType::VoiceCall,
        TrafficType::VideoCall,
        TrafficType::TextMessage,
        TrafficType::VoiceMessage,
        TrafficType::Other,
    ];

    /// Scheduling priority derived from the static traffic table.
    ///
    /// Real-time conversational traffic ranks highest, text lowest, and every other
    /// class (including unknown ones) sits at [`DEFAULT_PRIORITY`].
    pub const fn priority(self) -> u8 {
        match self {
            TrafficType::VoiceCall | TrafficType::VideoCall => 2,
            TrafficType::YouTube
            | TrafficType::Instagram
            | TrafficType::WhatsApp
            | TrafficType::VoiceMessage => 1,
            TrafficType::TextMessage => 0,
            TrafficType::Other => DEFAULT_PRIORITY,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            TrafficType::Instagram => "Instagram",
            TrafficType::WhatsApp => "WhatsApp",
            TrafficType::YouTube => "YouTube",
            TrafficType::VoiceCall => "Voice Call",
            TrafficType::VideoCall => "Video Call",
            TrafficType::TextMessage => "Text Message",
            TrafficType::VoiceMessage => "Voice Message",
            TrafficType::Other => "Other",
        }
    }
}

impl From<&str> for TrafficType {
    fn from(label: &str) -> Self {
        TrafficType::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(label.trim()))
            .unwrap_or(TrafficType::Other)
    }
}

impl From<String> for TrafficType {
    fn from(label: String) -> Self {
        TrafficType::from(label.as_str())
    }
}

impl From<TrafficType> for String {
    fn from(value: TrafficType) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for TrafficType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Key usable by [`ClassTable`]: a closed enum with a stable dense index.
pub trait TableKey: Copy + fmt::Display + 'static {
    const ALL: &'static [Self];

    fn index(self) -> usize;
}

/// How crowded the cell serving a stream is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserDensity {
    Low,
    Medium,
    High,
}

impl TableKey for UserDensity {
    const ALL: &'static [UserDensity] = &[UserDensity::Low, UserDensity::Medium, UserDensity::High];

    fn index(self) -> usize {
        match self {
            UserDensity::Low => 0,
            UserDensity::Medium => 1,
            UserDensity::High => 2,
        }
    }
}

impl fmt::Display for UserDensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UserDensity::Low => "low",
            UserDensity::Medium => "medium",
            UserDensity::High => "high",
        };
        write!(f, "{label}")
    }
}

/// Offered load reported by the producer alongside each packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficLoad {
    Light,
    Moderate,
    Heavy,
}

impl TableKey for TrafficLoad {
    const ALL: &'static [TrafficLoad] =
        &[TrafficLoad::Light, TrafficLoad::Moderate, TrafficLoad::Heavy];

    fn index(self) -> usize {
        match self {
            TrafficLoad::Light => 0,
            TrafficLoad::Moderate => 1,
            TrafficLoad::Heavy => 2,
        }
    }
}

impl fmt::Display for TrafficLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrafficLoad::Light => "light",
            TrafficLoad::Moderate => "moderate",
            TrafficLoad::Heavy => "heavy",
        };
        write!(f, "{label}")
    }
}

/// Helper structure wrapping a value per variant of a [`TableKey`] enum.
///
/// Call sites iterate `K::ALL`, so adding a variant only requires extending the key's
/// `ALL` list and its `index` mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTable<K: TableKey, T> {
    values: Vec<T>,
    _key: PhantomData<K>,
}

/// Per-density values (fairness bookkeeping).
pub type DensityTable<T> = ClassTable<UserDensity, T>;

/// Per-load values.
pub type LoadTable<T> = ClassTable<TrafficLoad, T>;

impl<K: TableKey, T> ClassTable<K, T> {
    /// Build a table by executing a closure for each key, in `K::ALL` order.
    pub fn from_fn(mut f: impl FnMut(K) -> T) -> Self {
        let mut values = Vec::with_capacity(K::ALL.len());
        for key in K::ALL {
            values.push(f(*key));
        }
        ClassTable {
            values,
            _key: PhantomData,
        }
    }

    pub fn get(&self, key: K) -> &T {
        &self.values[key.index()]
    }

    pub fn get_mut(&mut self, key: K) -> &mut T {
        &mut self.values[key.index()]
    }

    /// Iterate `(key, value)` pairs in `K::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> {
        K::ALL.iter().copied().zip(self.values.iter())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.values.iter()
    }
}

impl<K: TableKey, T: Default> Default for ClassTable<K, T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<K: TableKey, T> Index<K> for ClassTable<K, T> {
    type Output = T;

    fn index(&self, index: K) -> &Self::Output {
        self.get(index)
    }
}

impl<K: TableKey, T> IndexMut<K> for ClassTable<K, T> {
    fn index_mut(&mut self, index: K) -> &mut Self::Output {
        self.get_mut(index)
    }
}

impl<K: TableKey, T: Serialize> Serialize for ClassTable<K, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(&key.to_string(), value)?;
        }
        map.end()
    }
}

/// Ratio of least-served to most-served bucket counts.
///
/// 1.0 means perfectly even service; 0 when nothing was counted yet.
pub fn fairness_index(counts: &DensityTable<u64>) -> f64 {
    let (min, max) = min_max(counts);
    if max == 0 {
        return 0.0;
    }
    min as f64 / max as f64
}

/// Relative spread between the most- and least-served buckets, `(max - min) / max`.
pub fn fairness_penalty(counts: &DensityTable<u64>) -> f64 {
    let (min, max) = min_max(counts);
    if max == 0 {
        return 0.0;
    }
    (max - min) as f64 / max as f64
}

fn min_max(counts: &DensityTable<u64>) -> (u64, u64) {
    let min = counts.values().copied().min().unwrap_or(0);
    let max = counts.values().copied().max().unwrap_or(0);
    (min, max)
}
