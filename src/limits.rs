//! Resource limits applied to every program the shell launches.
//!
//! The limits are fixed once at startup, from defaults overridden by command
//! line options, and re-applied in each child before it executes.

use std::fmt;

use nix::libc::rlim_t;
use nix::sys::resource::{self, Resource};

use crate::errors::{ErrorKind, Result};

const ONE_GIB: u64 = 1 << 30;

/// The six resource kinds the shell constrains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LimitKind {
    Processes,
    DataSize,
    StackSize,
    OpenFiles,
    FileSize,
    CpuTime,
}

impl LimitKind {
    pub const ALL: [LimitKind; 6] = [
        LimitKind::Processes,
        LimitKind::DataSize,
        LimitKind::StackSize,
        LimitKind::OpenFiles,
        LimitKind::FileSize,
        LimitKind::CpuTime,
    ];

    /// The command line flag that overrides this limit.
    pub fn flag(self) -> char {
        match self {
            LimitKind::Processes => 'p',
            LimitKind::DataSize => 'd',
            LimitKind::StackSize => 's',
            LimitKind::OpenFiles => 'n',
            LimitKind::FileSize => 'f',
            LimitKind::CpuTime => 't',
        }
    }

    pub fn default_value(self) -> u64 {
        match self {
            LimitKind::Processes | LimitKind::OpenFiles => 256,
            LimitKind::DataSize | LimitKind::StackSize | LimitKind::FileSize => ONE_GIB,
            // effectively unlimited
            LimitKind::CpuTime => ONE_GIB,
        }
    }

    fn resource(self) -> Resource {
        match self {
            LimitKind::Processes => Resource::RLIMIT_NPROC,
            LimitKind::DataSize => Resource::RLIMIT_DATA,
            LimitKind::StackSize => Resource::RLIMIT_STACK,
            LimitKind::OpenFiles => Resource::RLIMIT_NOFILE,
            LimitKind::FileSize => Resource::RLIMIT_FSIZE,
            LimitKind::CpuTime => Resource::RLIMIT_CPU,
        }
    }

    fn index(self) -> usize {
        match self {
            LimitKind::Processes => 0,
            LimitKind::DataSize => 1,
            LimitKind::StackSize => 2,
            LimitKind::OpenFiles => 3,
            LimitKind::FileSize => 4,
            LimitKind::CpuTime => 5,
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            LimitKind::Processes => "processes",
            LimitKind::DataSize => "data size",
            LimitKind::StackSize => "stack size",
            LimitKind::OpenFiles => "open files",
            LimitKind::FileSize => "file size",
            LimitKind::CpuTime => "cpu time",
        };
        write!(f, "{}", name)
    }
}

/// A soft and hard limit pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limit {
    pub soft: u64,
    pub hard: u64,
}

impl Limit {
    /// A limit whose soft and hard values are both `value`.
    pub fn fixed(value: u64) -> Self {
        Limit {
            soft: value,
            hard: value,
        }
    }
}

/// One `Limit` per `LimitKind`. Immutable once built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceLimits {
    limits: [Limit; 6],
}

impl ResourceLimits {
    pub fn get(&self, kind: LimitKind) -> Limit {
        self.limits[kind.index()]
    }

    /// Returns a copy with `kind` set to the parsed `value`.
    ///
    /// `value` must be a non-negative integer; anything else is a
    /// configuration error rather than being read as zero.
    pub fn with_override(mut self, kind: LimitKind, value: &str) -> Result<Self> {
        let parsed = value
            .trim()
            .parse::<u64>()
            .map_err(|_| ErrorKind::InvalidLimit(kind.flag().to_string(), value.to_string()))?;
        self.limits[kind.index()] = Limit::fixed(parsed);
        Ok(self)
    }

    /// Builds limits from the defaults and a set of `(kind, value)` overrides.
    pub fn from_overrides<I, S>(overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (LimitKind, S)>,
        S: AsRef<str>,
    {
        overrides
            .into_iter()
            .try_fold(ResourceLimits::default(), |limits, (kind, value)| {
                limits.with_override(kind, value.as_ref())
            })
    }

    /// Applies every limit to the calling process.
    ///
    /// All six limits are attempted even if one fails; the first failure is
    /// returned.
    pub fn apply(&self) -> Result<()> {
        let mut first_error = None;
        for &kind in &LimitKind::ALL {
            let limit = self.get(kind);
            let result = resource::setrlimit(
                kind.resource(),
                limit.soft as rlim_t,
                limit.hard as rlim_t,
            );
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        let mut limits = [Limit::fixed(0); 6];
        for &kind in &LimitKind::ALL {
            limits[kind.index()] = Limit::fixed(kind.default_value());
        }
        ResourceLimits { limits }
    }
}
