// ── Path language ──
//
// A `Path` names a location inside a domain object's JSON shape. Paths are
// static data: declared once in a mapping table with the `path!` macro and
// shared by both conversion directions.

use std::fmt;

/// One step of a [`Path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A named field of an object.
    Field(&'static str),
    /// The current element of the enclosing repeated block.
    ///
    /// Bound to a concrete index by the converter at call time.
    Element,
}

/// An immutable sequence of [`Segment`]s rooted at the domain object.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Path {
    segments: &'static [Segment],
}

impl Path {
    /// The empty path (the domain object itself).
    pub const ROOT: Path = Path { segments: &[] };

    pub const fn new(segments: &'static [Segment]) -> Self {
        Self { segments }
    }

    pub const fn segments(&self) -> &'static [Segment] {
        self.segments
    }

    pub const fn len(&self) -> usize {
        self.segments.len()
    }

    pub const fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of [`Segment::Element`] markers in the path.
    pub fn marker_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Element))
            .count()
    }

    /// Whether the last segment is an element marker.
    pub fn ends_with_marker(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Element))
    }

    /// The first `len` segments (clamped to the path length).
    pub fn prefix(&self, len: usize) -> Path {
        let len = len.min(self.segments.len());
        Path {
            segments: self.segments.get(..len).unwrap_or_default(),
        }
    }

    /// The path without its last segment. The root is its own parent.
    pub fn parent(&self) -> Path {
        self.prefix(self.segments.len().saturating_sub(1))
    }

    /// Position of the `nth` (zero-based) element marker, if any.
    pub fn marker_position(&self, nth: usize) -> Option<usize> {
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s, Segment::Element))
            .nth(nth)
            .map(|(pos, _)| pos)
    }

    /// Longest common prefix of two paths.
    pub fn common_prefix(&self, other: &Path) -> Path {
        let shared = self
            .segments
            .iter()
            .zip(other.segments)
            .take_while(|(a, b)| a == b)
            .count();
        self.prefix(shared)
    }

    /// Render with markers replaced by the bound indices, e.g.
    /// `spec.selector.matchExpressions[1].key`.
    ///
    /// Markers beyond the bound indices render as `[]`.
    pub fn render(&self, indices: &[usize]) -> String {
        let mut out = String::new();
        let mut bound = indices.iter();
        for segment in self.segments {
            match segment {
                Segment::Field(name) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(name);
                }
                Segment::Element => match bound.next() {
                    Some(i) => {
                        out.push('[');
                        out.push_str(&i.to_string());
                        out.push(']');
                    }
                    None => out.push_str("[]"),
                },
            }
        }
        if out.is_empty() {
            out.push_str("<root>");
        }
        out
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&[]))
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({self})")
    }
}

/// Build a static [`Path`] from dotted segments; `[]` is the element marker.
///
/// ```
/// use tmc_core::path;
///
/// let p = path!(spec.selector.matchExpressions.[].key);
/// assert_eq!(p.marker_count(), 1);
/// assert_eq!(p.to_string(), "spec.selector.matchExpressions[].key");
/// ```
///
/// Field names that are Rust keywords can be written as string literals:
/// `path!(spec."type")`.
#[macro_export]
macro_rules! path {
    (@seg []) => {
        $crate::mapping::Segment::Element
    };
    (@seg $name:ident) => {
        $crate::mapping::Segment::Field(stringify!($name))
    };
    (@seg $name:literal) => {
        $crate::mapping::Segment::Field($name)
    };
    ($($seg:tt).+) => {{
        const SEGMENTS: &[$crate::mapping::Segment] = &[$($crate::path!(@seg $seg)),+];
        $crate::mapping::Path::new(SEGMENTS)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macro_builds_fields_and_markers() {
        let p = path!(spec.selector.[].key);
        assert_eq!(
            p.segments(),
            &[
                Segment::Field("spec"),
                Segment::Field("selector"),
                Segment::Element,
                Segment::Field("key"),
            ]
        );
        assert_eq!(p.marker_count(), 1);
        assert_eq!(p.marker_position(0), Some(2));
        assert_eq!(p.marker_position(1), None);
    }

    #[test]
    fn keyword_fields_use_literals() {
        let p = path!(spec."type");
        assert_eq!(p.segments(), &[Segment::Field("spec"), Segment::Field("type")]);
    }

    #[test]
    fn render_binds_indices_in_order() {
        let p = path!(spec.rules.[].ports.[].number);
        assert_eq!(p.render(&[1, 3]), "spec.rules[1].ports[3].number");
        assert_eq!(p.render(&[1]), "spec.rules[1].ports[].number");
        assert_eq!(Path::ROOT.render(&[]), "<root>");
    }

    #[test]
    fn prefix_parent_and_common_prefix() {
        let a = path!(meta.labels);
        let b = path!(meta.description);
        assert_eq!(a.common_prefix(&b), path!(meta));
        assert_eq!(a.parent(), path!(meta));
        assert_eq!(path!(meta).parent(), Path::ROOT);
        assert_eq!(Path::ROOT.parent(), Path::ROOT);
        assert_eq!(a.prefix(10), a);
        assert!(path!(spec.items.[]).ends_with_marker());
    }
}
