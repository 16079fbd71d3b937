//! Per-call writer/reader state: the reference table, the permanents
//! table, configuration, path trace, and a recursion-depth counter modeled
//! on `prost::encoding::DecodeContext`'s `enter_recursion`/`limit_reached`
//! pair (§9 "Recursion depth").

use std::io::{Read, Write};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::host::CollectorGuard;
use crate::path::{Path, PathGuard, PathSegment};
use crate::perms::{ReadPerms, WritePerms};
use crate::reftbl::{ReadRefTable, WriteRefTable};

pub struct Writer<'a, W> {
    pub out: &'a mut W,
    pub refs: WriteRefTable,
    pub perms: &'a WritePerms,
    pub config: &'a Config,
    pub path: Path,
    depth: u32,
}

impl<'a, W: Write> Writer<'a, W> {
    pub fn new(out: &'a mut W, perms: &'a WritePerms, config: &'a Config) -> Self {
        Writer {
            out,
            refs: WriteRefTable::new(),
            perms,
            config,
            path: Path::new(config.path),
            depth: 0,
        }
    }

    /// Pushes a path segment and enters one level of recursion, failing if
    /// `Config::max_recursion` would be exceeded. The returned guard pops
    /// the segment and decrements depth on drop, including on early return.
    pub fn enter(&mut self, segment: PathSegment) -> Result<PathGuard<'_>> {
        if self.depth >= self.config.max_recursion {
            return Err(Error::recursion_limit_reached());
        }
        self.depth += 1;
        Ok(PathGuard::new(&mut self.path, segment))
    }
}

/// Callers of `enter` must call `leave` exactly once on every exit path,
/// including errors; `codec::keyed` is the only call site.
impl<'a, W> Writer<'a, W> {
    pub(crate) fn leave(&mut self) {
        self.depth -= 1;
    }
}

pub struct Reader<'a, R> {
    pub src: &'a mut R,
    pub refs: ReadRefTable,
    pub perms: &'a ReadPerms,
    pub config: &'a Config,
    pub path: Path,
    depth: u32,
    _collector: CollectorGuard,
}

impl<'a, R: Read> Reader<'a, R> {
    pub fn new(src: &'a mut R, perms: &'a ReadPerms, config: &'a Config) -> Self {
        Reader {
            src,
            refs: ReadRefTable::new(),
            perms,
            config,
            path: Path::new(config.path),
            depth: 0,
            _collector: CollectorGuard::suspend(),
        }
    }

    pub fn enter(&mut self, segment: PathSegment) -> Result<PathGuard<'_>> {
        if self.depth >= self.config.max_recursion {
            return Err(Error::recursion_limit_reached());
        }
        self.depth += 1;
        Ok(PathGuard::new(&mut self.path, segment))
    }
}

impl<'a, R> Reader<'a, R> {
    pub(crate) fn leave(&mut self) {
        self.depth -= 1;
    }
}
