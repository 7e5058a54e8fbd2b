//! The compiler's configuration surface (§6.3): recognized options, their
//! defaults, and the construction-time validation the driver applies to
//! them.

use rv32im_kernels::memory::secure::PRODUCTION_LEVELS;

/// Which memory backend the lowered circuit should use for loads and
/// stores.
///
/// The tiers trade addressable range for gate cost per access: `Ultra` is
/// cheapest but smallest, `Secure` is authenticated but orders of magnitude
/// more expensive and only supports compile-time-constant addresses (see
/// [`rv32im_kernels::SecureMemory`]'s module docs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoryTierKind {
    Ultra,
    #[default]
    Simple,
    Secure,
}

impl MemoryTierKind {
    /// Chooses `Ultra` when `requested_bytes` fits in its 8-word capacity,
    /// `Simple` otherwise. Mirrors spec.md's "constrained constructor".
    pub fn constrained_for(requested_bytes: usize) -> Self {
        if requested_bytes <= Self::Ultra.capacity_bytes() {
            MemoryTierKind::Ultra
        } else {
            MemoryTierKind::Simple
        }
    }

    /// The exact memory image size, in bytes, this tier addresses.
    pub fn capacity_bytes(self) -> usize {
        match self {
            MemoryTierKind::Ultra => 8 * 4,
            MemoryTierKind::Simple => 256 * 4,
            MemoryTierKind::Secure => (1 << PRODUCTION_LEVELS) * 4,
        }
    }
}

/// Compiler-wide knobs, matching spec.md §6.3's recognized options one for
/// one. `Default` is the platform's baseline profile.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Whether the Parallel Driver partitions the instruction stream into
    /// dependency-free batches across worker threads, or every instruction
    /// lowers sequentially through one `Emitter`.
    pub enable_parallel: bool,
    /// Whether the fusion peephole collapses recognized adjacent
    /// instruction pairs before individual lowering.
    pub enable_fusion: bool,
    /// Whether the emitter deduplicates structurally identical gates.
    pub enable_deduplication: bool,
    /// Whether the emitter memoizes whole multi-gate kernel shapes.
    pub enable_caching: bool,
    /// Worker thread count for the Parallel Driver, clamped to `1..=16` at
    /// construction.
    pub num_threads: usize,
    /// Maximum instructions considered per dependency-batch-formation pass.
    pub batch_size: usize,
    /// Which memory backend loads/stores compile against.
    pub memory_tier: MemoryTierKind,
    /// Upper bound on the number of instructions this compiler will lower;
    /// exceeding it is reported as
    /// [`crate::error::CompileError::OutOfMemory`] rather than left to run
    /// unbounded.
    pub max_instructions: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            enable_parallel: true,
            enable_fusion: true,
            enable_deduplication: true,
            enable_caching: true,
            num_threads: 8,
            batch_size: 10_000,
            memory_tier: MemoryTierKind::default(),
            max_instructions: 1 << 20,
        }
    }
}

impl CompilerConfig {
    /// Clamps `num_threads` to `1..=16` and rejects a zero `batch_size`,
    /// matching the ranges spec.md's configuration surface documents.
    pub fn validated(mut self) -> Self {
        self.num_threads = self.num_threads.clamp(1, 16);
        if self.batch_size == 0 {
            self.batch_size = Self::default().batch_size;
        }
        if !self.enable_parallel {
            self.num_threads = 1;
        }
        self
    }

    /// The exact memory image size the selected tier addresses.
    pub fn memory_capacity_bytes(&self) -> usize {
        self.memory_tier.capacity_bytes()
    }
}
