//! Human-readable path trace, accumulated only when [`crate::Config::path`] is enabled.
//!
//! Mirrors the shape of a Protobuf decode error's field path, except the
//! segments here describe positions in an arbitrary object graph rather than
//! message fields: table keys, upvalue slots, call-info frames.

use std::fmt;

/// One step on the way from the root value down to where an error occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PathSegment {
    /// A table value reached through a (stringified) key.
    TableKey(String),
    /// The table's metatable slot.
    Metatable,
    /// One upvalue of a closure, by index.
    Upvalue(usize),
    /// The prototype of a closure.
    Prototype,
    /// A nested child prototype, by index.
    ChildPrototype(usize),
    /// A stack slot of a thread, by offset.
    StackSlot(usize),
    /// A call-info frame, by depth from the base of the call stack.
    CallInfo(usize),
    /// The permanent-key indirection.
    PermanentKey,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::TableKey(k) => write!(f, "[{k}]"),
            PathSegment::Metatable => write!(f, ".<metatable>"),
            PathSegment::Upvalue(i) => write!(f, ".<upvalue {i}>"),
            PathSegment::Prototype => write!(f, ".<proto>"),
            PathSegment::ChildPrototype(i) => write!(f, ".<proto {i}>"),
            PathSegment::StackSlot(i) => write!(f, ".<stack {i}>"),
            PathSegment::CallInfo(i) => write!(f, ".<frame {i}>"),
            PathSegment::PermanentKey => write!(f, ".<permanent key>"),
        }
    }
}

/// Stack of [`PathSegment`]s from the root to the current position.
///
/// When path tracking is disabled (the default, see [`crate::Config::path`])
/// this stays empty and `push`/`pop` are cheap no-ops beyond the `bool` check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    enabled: bool,
    segments: Vec<PathSegment>,
}

impl Path {
    pub fn new(enabled: bool) -> Self {
        Path {
            enabled,
            segments: Vec::new(),
        }
    }

    pub fn push(&mut self, segment: PathSegment) {
        if self.enabled {
            self.segments.push(segment);
        }
    }

    pub fn pop(&mut self) {
        if self.enabled {
            self.segments.pop();
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return Ok(());
        }
        f.write_str(" at root")?;
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// RAII guard that pushes a segment on construction and pops it on drop,
/// so a path entry is never leaked on an early `?` return.
pub struct PathGuard<'a> {
    path: &'a mut Path,
}

impl<'a> PathGuard<'a> {
    pub fn new(path: &'a mut Path, segment: PathSegment) -> Self {
        path.push(segment);
        PathGuard { path }
    }
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        self.path.pop();
    }
}
