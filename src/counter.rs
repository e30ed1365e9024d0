//! Wraparound-safe arithmetic for raw kernel counters.
//!
//! Kernel I/O counters are cumulative unsigned integers that wrap at the word
//! size of the CPU architecture, i.e. at 2^32 - 1 or 2^64 - 1. Subtracting two
//! readings therefore has to account for the counter having wrapped past its
//! maximum between samples.

/// Width of the kernel's raw counters, which follows the word size of the
/// host architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterWidth {
    U32,
    U64,
}

/// Architectures whose counters wrap at 2^64 - 1. Everything else is assumed
/// to use 32-bit counters.
const WIDE_ARCHES: &[&str] = &[
    "x86_64",
    "aarch64",
    "ia64",
    "powerpc64",
    "riscv64",
    "mips64",
    "s390x",
    "sparc64",
    "loongarch64",
];

impl CounterWidth {
    /// Determines the counter width of the host architecture.
    pub fn detect() -> Self {
        Self::from_arch(std::env::consts::ARCH)
    }

    fn from_arch(arch: &str) -> Self {
        if WIDE_ARCHES.contains(&arch) {
            CounterWidth::U64
        } else {
            CounterWidth::U32
        }
    }

    /// The maximum representable counter value before the counter wraps back
    /// to zero.
    pub fn wrap_modulus(self) -> u64 {
        match self {
            CounterWidth::U32 => u32::MAX as u64,
            CounterWidth::U64 => u64::MAX,
        }
    }
}

/// Subtracts two readings of a monotonically-increasing counter.
///
/// When `newer` is smaller than `older` the counter is treated as having
/// wrapped exactly once past `modulus` and continued counting up to `newer`.
/// Multiple wraps within one sampling interval cannot be distinguished from a
/// single wrap and are not detected.
pub fn subtract(newer: u64, older: u64, modulus: u64) -> u64 {
    if older <= newer {
        newer - older
    } else {
        (modulus - older) + newer
    }
}
