//! UOp constructors.
//!
//! Graph construction belongs to the surrounding compiler; these constructors
//! exist for producers and for building fixtures in tests. They assign stable
//! ids from a process-wide atomic counter and perform no validation - the
//! whole point of the rule sets is to judge what producers built.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use dozor_dtype::DType;

use crate::op::Ops;
use crate::types::{Arg, Kernel};
use crate::uop::UOp;
use crate::view::Tracker;

// Monotonic node ids; uniqueness only, no synchronization needed.
static UOP_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_uop_id() -> u64 {
    UOP_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

// Counter backing UNIQUE marker arguments.
static UNIQUE_COUNTER: AtomicI64 = AtomicI64::new(0);

fn next_unique_id() -> i64 {
    UNIQUE_COUNTER.fetch_add(1, Ordering::Relaxed)
}

impl UOp {
    /// Create a node. The only universal constructor; everything else is
    /// shorthand over it.
    pub fn new(op: Ops, dtype: DType, src: Vec<Arc<UOp>>, arg: Arg) -> Arc<Self> {
        Arc::new(Self {
            id: next_uop_id(),
            op,
            dtype,
            src: src.into(),
            arg,
            tracker_cache: std::sync::OnceLock::new(),
            range_cache: std::sync::OnceLock::new(),
        })
    }

    /// Fresh UNIQUE marker.
    pub fn unique() -> Arc<Self> {
        Self::new(Ops::Unique, DType::Void, vec![], Arg::Int(next_unique_id()))
    }

    /// DEVICE node carrying a device-name string.
    pub fn device(name: impl Into<String>) -> Arc<Self> {
        Self::new(Ops::Device, DType::Void, vec![], Arg::Str(name.into()))
    }

    /// BUFFER over an existing device/unique pair.
    pub fn buffer(device: Arc<UOp>, unique: Arc<UOp>, size: i64, dtype: DType) -> Arc<Self> {
        Self::new(Ops::Buffer, dtype, vec![device, unique], Arg::Int(size))
    }

    /// Convenience: DEVICE + UNIQUE + BUFFER in one step.
    pub fn new_buffer(device_name: &str, size: i64, dtype: DType) -> Arc<Self> {
        Self::buffer(Self::device(device_name), Self::unique(), size, dtype)
    }

    /// Constant with an explicit payload.
    pub fn const_(dtype: DType, arg: Arg) -> Arc<Self> {
        Self::new(Ops::Const, dtype, vec![], arg)
    }

    /// Index-typed integer constant, the workhorse of offset expressions.
    pub fn iconst(value: i64) -> Arc<Self> {
        Self::const_(DType::Index, Arg::Int(value))
    }

    /// Generic ALU node over explicit sources.
    pub fn alu<I: IntoIterator<Item = Arc<UOp>>>(op: Ops, dtype: DType, src: I) -> Arc<Self> {
        Self::new(op, dtype, src.into_iter().collect(), Arg::None)
    }

    /// SINK collecting side-effecting writes.
    pub fn sink<I: IntoIterator<Item = Arc<UOp>>>(src: I) -> Arc<Self> {
        Self::new(Ops::Sink, DType::Void, src.into_iter().collect(), Arg::None)
    }

    /// DEFINE_GLOBAL slot.
    pub fn define_global(slot: i64, dtype: DType) -> Arc<Self> {
        Self::new(Ops::DefineGlobal, dtype, vec![], Arg::Int(slot))
    }

    /// DEFINE_LOCAL slot.
    pub fn define_local(slot: i64, dtype: DType) -> Arc<Self> {
        Self::new(Ops::DefineLocal, dtype, vec![], Arg::Int(slot))
    }

    /// Runtime variable with inclusive bounds.
    pub fn define_var(name: impl Into<String>, min: i64, max: i64) -> Arc<Self> {
        Self::new(
            Ops::DefineVar,
            DType::Index,
            vec![],
            Arg::Tuple(vec![Arg::Str(name.into()), Arg::Int(min), Arg::Int(max)]),
        )
    }

    /// Loop counter over `[start, end)` with a loop id argument.
    pub fn range(start: Arc<UOp>, end: Arc<UOp>, loop_id: i64) -> Arc<Self> {
        let dtype = start.dtype().clone();
        Self::new(Ops::Range, dtype, vec![start, end], Arg::Int(loop_id))
    }

    /// Loop counter over `[0, n)`.
    pub fn loop_range(n: i64, loop_id: i64) -> Arc<Self> {
        Self::range(Self::iconst(0), Self::iconst(n), loop_id)
    }

    /// Hardware special id (thread/group index) with a static extent.
    pub fn special(name: impl Into<String>, extent: i64) -> Arc<Self> {
        Self::new(
            Ops::Special,
            DType::Index,
            vec![],
            Arg::Tuple(vec![Arg::Str(name.into()), Arg::Int(extent)]),
        )
    }

    /// VIEW node carrying a strided-view descriptor.
    pub fn view(dtype: DType, tracker: Tracker, src: Vec<Arc<UOp>>) -> Arc<Self> {
        Self::new(Ops::View, dtype, src, Arg::View(tracker))
    }

    /// INDEX into a buffer, optionally gated.
    pub fn index(buffer: Arc<UOp>, offset: Arc<UOp>, gate: Option<Arc<UOp>>) -> Arc<Self> {
        let dtype = buffer.dtype().clone();
        let mut src = vec![buffer, offset];
        src.extend(gate);
        Self::new(Ops::Index, dtype, src, Arg::None)
    }

    /// KERNEL descriptor node over its buffer/assign dependencies.
    pub fn kernel<I: IntoIterator<Item = Arc<UOp>>>(ast: Arc<UOp>, deps: I) -> Arc<Self> {
        Self::new(Ops::Kernel, DType::Void, deps.into_iter().collect(), Arg::Kernel(Kernel::new(ast)))
    }

    /// ASSIGN of a value to a buffer target.
    pub fn assign(target: Arc<UOp>, value: Arc<UOp>) -> Arc<Self> {
        let dtype = target.dtype().clone();
        Self::new(Ops::Assign, dtype, vec![target, value], Arg::None)
    }

    /// BIND a variable to a value.
    pub fn bind(var: Arc<UOp>, value: Arc<UOp>) -> Arc<Self> {
        let dtype = var.dtype().clone();
        Self::new(Ops::Bind, dtype, vec![var, value], Arg::None)
    }
}
