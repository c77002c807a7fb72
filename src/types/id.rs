// ABOUTME: Phantom-typed identifiers for jobs, sites, and the provider resources behind them.
// ABOUTME: Each kind is a separate type, so a ProjectId never stands in for a DeploymentId.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Names an identifier kind in debug output.
pub trait IdKind {
    const NAME: &'static str;
}

macro_rules! id_kinds {
    ($($marker:ident => $alias:ident),* $(,)?) => {
        $(
            pub enum $marker {}

            impl IdKind for $marker {
                const NAME: &'static str = stringify!($alias);
            }

            pub type $alias = Id<$marker>;
        )*
    };
}

id_kinds! {
    JobMarker => JobId,
    SiteMarker => SiteId,
    DatabaseMarker => DatabaseId,
    RepositoryMarker => RepositoryId,
    ProjectMarker => ProjectId,
    DeploymentMarker => DeploymentId,
}

/// An opaque identifier tagged with the kind of thing it names.
///
/// Provider identifiers arrive as plain strings; the tag only exists at
/// compile time.
#[must_use = "IDs reference resources and should not be ignored"]
pub struct Id<T> {
    value: String,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _kind: PhantomData,
        }
    }

    /// Fresh random identifier (UUID v4).
    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_inner(self) -> String {
        self.value
    }
}

impl<T: IdKind> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", T::NAME, self.value)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

// Derives would demand the bounds of T; the marker is never stored.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> AsRef<str> for Id<T> {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct() {
        let a = JobId::generate();
        let b = JobId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn id_serializes_as_plain_string() {
        let id = SiteId::new("site-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"site-1\"");

        let back: SiteId = serde_json::from_str("\"site-1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn debug_names_the_kind() {
        assert_eq!(format!("{:?}", ProjectId::new("prj_1")), "ProjectId(\"prj_1\")");
        assert_eq!(DeploymentId::new("dpl_1").to_string(), "dpl_1");
    }
}
