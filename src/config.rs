//! Explicit, per-call configuration.
//!
//! The source engine's knobs (`debug`, `path`, `passIO`, `persistKey`) are
//! process-wide globals. Per the design notes (§9 "Global state") they are
//! redesigned here as a plain record threaded by reference through every
//! entry point, in the manner `prost::encoding::DecodeContext` is threaded
//! through a decode call rather than read from a global.

/// Default name of the metatable key consulted for special persistence.
pub const DEFAULT_PERSIST_KEY: &str = "__persist";

/// Default recursion bound, chosen to match the 100-deep default the
/// Protobuf C++ implementation uses for nested messages (see the design
/// notes on bounding recursion depth).
pub const DEFAULT_MAX_RECURSION: u32 = 100;

/// Configuration threaded through a single `dump`/`undump` call.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Whether prototype debug info (source name, line table, locals) is
    /// emitted and expected.
    pub debug: bool,
    /// Whether to accumulate a human-readable [`crate::path::Path`] for
    /// error messages. Off by default: it costs a push/pop per recursive
    /// call even when nothing fails.
    pub path: bool,
    /// Whether special-persistence callables are invoked with the opaque
    /// I/O handle as an extra argument.
    pub pass_io: bool,
    /// Name of the metatable key special persistence is dispatched through.
    pub persist_key: String,
    /// Upper bound on dispatcher recursion depth.
    pub max_recursion: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            debug: true,
            path: false,
            pass_io: false,
            persist_key: DEFAULT_PERSIST_KEY.to_string(),
            max_recursion: DEFAULT_MAX_RECURSION,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_path(mut self, path: bool) -> Self {
        self.path = path;
        self
    }

    pub fn with_pass_io(mut self, pass_io: bool) -> Self {
        self.pass_io = pass_io;
        self
    }

    pub fn with_persist_key(mut self, key: impl Into<String>) -> Self {
        self.persist_key = key.into();
        self
    }

    pub fn with_max_recursion(mut self, max_recursion: u32) -> Self {
        self.max_recursion = max_recursion;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_source_engine() {
        let cfg = Config::default();
        assert!(cfg.debug);
        assert!(!cfg.path);
        assert!(!cfg.pass_io);
        assert_eq!(cfg.persist_key, "__persist");
        assert_eq!(cfg.max_recursion, 100);
    }

    #[test]
    fn builder_overrides_chain() {
        let cfg = Config::new().with_debug(false).with_persist_key("__save");
        assert!(!cfg.debug);
        assert_eq!(cfg.persist_key, "__save");
    }
}
