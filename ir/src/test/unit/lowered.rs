//! Low-level op rule tests, row by row.

use std::sync::Arc;

use dozor_dtype::{AddrSpace, DType, ImageKind};

use crate::op::Ops;
use crate::pattern::Verdict;
use crate::types::Arg;
use crate::uop::UOp;
use crate::verify::{VerifyOptions, op_rules};
use crate::view::Tracker;

fn judge(node: &Arc<UOp>) -> Verdict {
    op_rules().judge(node, &VerifyOptions::default())
}

fn global_ptr(size: usize) -> DType {
    DType::Float32.ptr(Some(size), AddrSpace::Global)
}

fn local_ptr(size: usize) -> DType {
    DType::Float32.ptr(Some(size), AddrSpace::Local)
}

// =========================================================================
// Memory definitions
// =========================================================================

#[test]
fn define_global_requires_non_local_pointer() {
    assert_eq!(judge(&UOp::define_global(0, global_ptr(16))), Verdict::Accept);

    let image = DType::Image { kind: ImageKind::Float, shape: vec![4, 16, 4] };
    assert_eq!(judge(&UOp::define_global(0, image)), Verdict::Accept);

    assert_eq!(judge(&UOp::define_global(0, local_ptr(16))), Verdict::Reject);
    assert_eq!(judge(&UOp::define_global(0, DType::Float32)), Verdict::Reject);
}

#[test]
fn define_local_requires_local_pointer() {
    assert_eq!(judge(&UOp::define_local(0, local_ptr(16))), Verdict::Accept);
    assert_eq!(judge(&UOp::define_local(0, global_ptr(16))), Verdict::Reject);
}

#[test]
fn define_acc_sources_after_first_are_ranges() {
    let init = UOp::const_(DType::Float32, Arg::Float(0.0));
    let good = UOp::new(
        Ops::DefineAcc,
        DType::Float32,
        vec![init.clone(), UOp::loop_range(4, 0)],
        Arg::None,
    );
    assert_eq!(judge(&good), Verdict::Accept);

    let not_a_range = UOp::new(
        Ops::DefineAcc,
        DType::Float32,
        vec![init.clone(), UOp::iconst(4)],
        Arg::None,
    );
    assert_eq!(judge(&not_a_range), Verdict::Reject);

    let wrong_dtype = UOp::new(Ops::DefineAcc, DType::Int32, vec![init], Arg::None);
    assert_eq!(judge(&wrong_dtype), Verdict::Reject);
}

#[test]
fn define_var_bounds_must_be_integers() {
    assert_eq!(judge(&UOp::define_var("n", 0, 8)), Verdict::Accept);

    let bad = UOp::new(
        Ops::DefineVar,
        DType::Index,
        vec![],
        Arg::Tuple(vec![Arg::Str("n".into()), Arg::Float(0.0), Arg::Int(8)]),
    );
    assert_eq!(judge(&bad), Verdict::Reject);

    let no_tuple = UOp::new(Ops::DefineVar, DType::Index, vec![], Arg::Int(0));
    assert_eq!(judge(&no_tuple), Verdict::Reject);
}

#[test]
fn range_endpoints_share_its_dtype() {
    assert_eq!(judge(&UOp::loop_range(8, 0)), Verdict::Accept);

    let mixed = UOp::new(
        Ops::Range,
        DType::Index,
        vec![UOp::iconst(0), UOp::const_(DType::Int32, Arg::Int(8))],
        Arg::Int(0),
    );
    assert_eq!(judge(&mixed), Verdict::Reject);

    let no_loop_id = UOp::new(
        Ops::Range,
        DType::Index,
        vec![UOp::iconst(0), UOp::iconst(8)],
        Arg::None,
    );
    assert_eq!(judge(&no_loop_id), Verdict::Reject);
}

#[test]
fn special_without_sources_accepts() {
    assert_eq!(judge(&UOp::special("gidx0", 16)), Verdict::Accept);
}

// =========================================================================
// Views, constants
// =========================================================================

#[test]
fn view_forms() {
    let bare = UOp::view(DType::Void, Tracker::from_shape(&[4]), vec![]);
    assert_eq!(judge(&bare), Verdict::Accept);

    let buf = UOp::new_buffer("CPU", 4, DType::Float32);
    let wrap = UOp::view(DType::Float32, Tracker::from_shape(&[4]), vec![buf.clone()]);
    assert_eq!(judge(&wrap), Verdict::Accept);

    let base_mismatch = UOp::view(DType::Int32, Tracker::from_shape(&[4]), vec![buf]);
    assert_eq!(judge(&base_mismatch), Verdict::Reject);

    let store = UOp::new(Ops::Store, DType::Void, vec![], Arg::None);
    let over_store = UOp::view(DType::Void, Tracker::from_shape(&[4]), vec![store]);
    assert_eq!(judge(&over_store), Verdict::Reject);
}

#[test]
fn valid_wraps_a_view() {
    let view = UOp::view(DType::Void, Tracker::from_shape(&[4]), vec![]);
    let valid = UOp::new(Ops::Valid, DType::Bool, vec![view], Arg::None);
    assert_eq!(judge(&valid), Verdict::Accept);
}

#[test]
fn const_payload_kind_follows_dtype() {
    assert_eq!(judge(&UOp::const_(DType::Float32, Arg::Float(1.5))), Verdict::Accept);
    assert_eq!(judge(&UOp::const_(DType::Int32, Arg::Int(3))), Verdict::Accept);
    assert_eq!(judge(&UOp::const_(DType::Bool, Arg::Bool(true))), Verdict::Accept);
    assert_eq!(judge(&UOp::const_(DType::UInt8, Arg::Int(200))), Verdict::Accept);

    assert_eq!(judge(&UOp::const_(DType::Float32, Arg::Int(1))), Verdict::Reject);
    assert_eq!(judge(&UOp::const_(DType::Int32, Arg::Bool(true))), Verdict::Reject);
    assert_eq!(judge(&UOp::const_(DType::Void, Arg::Int(0))), Verdict::Reject);
    assert_eq!(judge(&UOp::const_(DType::Float32, Arg::None)), Verdict::Reject);
}

// =========================================================================
// Memory access, both generations
// =========================================================================

#[test]
fn early_load_and_store_shapes() {
    let buf = UOp::define_global(0, global_ptr(16));
    let view = UOp::view(DType::Float32, Tracker::from_shape(&[16]), vec![]);

    let load = UOp::new(Ops::Load, DType::Float32, vec![buf.clone(), view.clone()], Arg::None);
    assert_eq!(judge(&load), Verdict::Accept);

    let value = UOp::const_(DType::Float32, Arg::Float(0.0));
    let store = UOp::new(
        Ops::Store,
        DType::Void,
        vec![buf.clone(), view.clone(), value],
        Arg::None,
    );
    assert_eq!(judge(&store), Verdict::Accept);

    let load_after_store =
        UOp::new(Ops::Load, DType::Float32, vec![buf, view, store], Arg::None);
    assert_eq!(judge(&load_after_store), Verdict::Accept);
}

#[test]
fn indexed_load_forms() {
    let buf = UOp::define_global(0, global_ptr(16));
    let idx = UOp::index(buf, UOp::loop_range(16, 0), None);

    assert_eq!(judge(&idx), Verdict::Accept);

    let load = UOp::new(Ops::Load, DType::Float32, vec![idx.clone()], Arg::None);
    assert_eq!(judge(&load), Verdict::Accept);

    let barrier = UOp::new(Ops::Barrier, DType::Void, vec![], Arg::None);
    let after_barrier =
        UOp::new(Ops::Load, DType::Float32, vec![idx.clone(), barrier], Arg::None);
    assert_eq!(judge(&after_barrier), Verdict::Accept);

    let alt = UOp::const_(DType::Float32, Arg::Float(0.0));
    let gated = UOp::new(Ops::Load, DType::Float32, vec![idx.clone(), alt], Arg::None);
    assert_eq!(judge(&gated), Verdict::Accept);

    let alt_mismatch = UOp::const_(DType::Int32, Arg::Int(0));
    let bad = UOp::new(Ops::Load, DType::Float32, vec![idx, alt_mismatch], Arg::None);
    assert_eq!(judge(&bad), Verdict::Reject);
}

#[test]
fn indexed_store_forms() {
    let buf = UOp::define_global(0, global_ptr(16));
    let idx = UOp::index(buf, UOp::loop_range(16, 0), None);
    let value = UOp::const_(DType::Float32, Arg::Float(1.0));

    let store = UOp::new(Ops::Store, DType::Void, vec![idx.clone(), value.clone()], Arg::None);
    assert_eq!(judge(&store), Verdict::Accept);

    let gate = UOp::const_(DType::Bool, Arg::Bool(true));
    let gated = UOp::new(
        Ops::Store,
        DType::Void,
        vec![idx.clone(), value.clone(), gate],
        Arg::None,
    );
    assert_eq!(judge(&gated), Verdict::Accept);

    let if_gate = UOp::new(
        Ops::If,
        DType::Void,
        vec![UOp::const_(DType::Bool, Arg::Bool(true))],
        Arg::None,
    );
    let if_gated = UOp::new(
        Ops::Store,
        DType::Void,
        vec![idx.clone(), value.clone(), if_gate],
        Arg::None,
    );
    assert_eq!(judge(&if_gated), Verdict::Accept);

    // A store producing a value is not a store.
    let typed = UOp::new(Ops::Store, DType::Float32, vec![idx, value], Arg::None);
    assert_eq!(judge(&typed), Verdict::Abstain);
}

#[test]
fn raw_pointer_access_is_admitted() {
    let addr = UOp::const_(DType::Int64, Arg::Int(0x1000));
    let load = UOp::new(Ops::Load, DType::Float32, vec![addr.clone()], Arg::None);
    assert_eq!(judge(&load), Verdict::Accept);

    let store = UOp::new(
        Ops::Store,
        DType::Float32,
        vec![addr, UOp::const_(DType::Float32, Arg::Float(0.0))],
        Arg::None,
    );
    assert_eq!(judge(&store), Verdict::Accept);
}

// =========================================================================
// ALU
// =========================================================================

#[test]
fn where_shares_one_dtype() {
    let cond = UOp::const_(DType::Bool, Arg::Bool(true));
    let a = UOp::const_(DType::Float32, Arg::Float(1.0));
    let b = UOp::const_(DType::Float32, Arg::Float(2.0));
    let good = UOp::new(Ops::Where, DType::Float32, vec![cond.clone(), a.clone(), b], Arg::None);
    assert_eq!(judge(&good), Verdict::Accept);

    let int_branch = UOp::const_(DType::Int32, Arg::Int(2));
    let bad = UOp::new(Ops::Where, DType::Float32, vec![cond, a, int_branch], Arg::None);
    assert_eq!(judge(&bad), Verdict::Reject);
}

#[test]
fn comparisons_are_boolean_over_agreeing_bases() {
    let a = UOp::const_(DType::Int32, Arg::Int(1));
    let b = UOp::const_(DType::Int32, Arg::Int(2));
    let good = UOp::new(Ops::Cmplt, DType::Bool, vec![a.clone(), b], Arg::None);
    assert_eq!(judge(&good), Verdict::Accept);

    let f = UOp::const_(DType::Float32, Arg::Float(2.0));
    let mixed = UOp::new(Ops::Cmpne, DType::Bool, vec![a.clone(), f], Arg::None);
    assert_eq!(judge(&mixed), Verdict::Reject);

    // A non-boolean comparison result falls through to the generic ALU
    // rule, which only requires operand/result base agreement.
    let int_result = UOp::new(Ops::Cmplt, DType::Int32, vec![a.clone(), a], Arg::None);
    assert_eq!(judge(&int_result), Verdict::Accept);
}

#[test]
fn shifts_keep_left_dtype() {
    let x = UOp::const_(DType::Int16, Arg::Int(4));
    let same = UOp::new(Ops::Shl, DType::Int16, vec![x.clone(), x.clone()], Arg::None);
    assert_eq!(judge(&same), Verdict::Accept);

    let unsigned_amount = UOp::const_(DType::UInt32, Arg::Int(2));
    let by_uint = UOp::new(Ops::Shr, DType::Int16, vec![x.clone(), unsigned_amount], Arg::None);
    assert_eq!(judge(&by_uint), Verdict::Accept);

    let float_amount = UOp::const_(DType::Float32, Arg::Float(2.0));
    let bad_amount = UOp::new(Ops::Shl, DType::Int16, vec![x.clone(), float_amount], Arg::None);
    assert_eq!(judge(&bad_amount), Verdict::Reject);

    let result_mismatch = UOp::new(Ops::Shl, DType::Int32, vec![x.clone(), x], Arg::None);
    assert_eq!(judge(&result_mismatch), Verdict::Reject);
}

#[test]
fn idiv_mod_require_integers() {
    let f = UOp::const_(DType::Float32, Arg::Float(4.0));
    let non_int = UOp::new(Ops::Idiv, DType::Float32, vec![f.clone(), f], Arg::None);
    assert_eq!(judge(&non_int), Verdict::Reject);

    // Integer case defers to the generic ALU rule, which accepts agreement
    // and rejects mismatch.
    let a = UOp::const_(DType::Int32, Arg::Int(8));
    let agreeing = UOp::new(Ops::Mod, DType::Int32, vec![a.clone(), a.clone()], Arg::None);
    assert_eq!(judge(&agreeing), Verdict::Accept);

    let b = UOp::const_(DType::Int64, Arg::Int(2));
    let mismatched = UOp::new(Ops::Idiv, DType::Int32, vec![a, b], Arg::None);
    assert_eq!(judge(&mismatched), Verdict::Reject);
}

#[test]
fn generic_alu_bases_must_agree() {
    let a = UOp::const_(DType::Float32, Arg::Float(1.0));
    let b = UOp::const_(DType::Float32, Arg::Float(2.0));
    assert_eq!(judge(&UOp::alu(Ops::Add, DType::Float32, [a.clone(), b])), Verdict::Accept);

    let i = UOp::const_(DType::Int32, Arg::Int(2));
    assert_eq!(judge(&UOp::alu(Ops::Mul, DType::Float32, [a.clone(), i])), Verdict::Reject);

    // Vector result over scalar sources of the same base is lane-agnostic.
    let vec4 = UOp::alu(Ops::Sqrt, DType::Float32.vec(4), [a]);
    assert_eq!(judge(&vec4), Verdict::Accept);
}

// =========================================================================
// Structure ops
// =========================================================================

#[test]
fn lowered_assign_targets_acc_or_global() {
    let acc = UOp::new(
        Ops::DefineAcc,
        DType::Float32,
        vec![UOp::const_(DType::Float32, Arg::Float(0.0))],
        Arg::None,
    );
    let value = UOp::const_(DType::Float32, Arg::Float(1.0));
    let good = UOp::new(Ops::Assign, DType::Float32, vec![acc, value.clone()], Arg::None);
    assert_eq!(judge(&good), Verdict::Accept);

    let not_a_target = UOp::new(
        Ops::Assign,
        DType::Float32,
        vec![value.clone(), value],
        Arg::None,
    );
    assert_eq!(judge(&not_a_target), Verdict::Abstain);
}

#[test]
fn endrange_closes_a_range() {
    let rng = UOp::loop_range(4, 0);
    let end = UOp::new(Ops::EndRange, DType::Void, vec![rng], Arg::None);
    assert_eq!(judge(&end), Verdict::Accept);

    let not_a_range = UOp::new(Ops::EndRange, DType::Void, vec![UOp::iconst(0)], Arg::None);
    assert_eq!(judge(&not_a_range), Verdict::Abstain);
}

#[test]
fn wmma_carries_an_eight_tuple() {
    let x = UOp::const_(DType::Float32, Arg::Float(0.0));
    let descriptor = Arg::Tuple(vec![
        Arg::Str("wmma".into()),
        Arg::ints([16, 16, 16]),
        Arg::Str("half".into()),
        Arg::Str("float".into()),
        Arg::Str("CUDA".into()),
        Arg::Int(32),
        Arg::Int(2),
        Arg::None,
    ]);
    let good = UOp::new(
        Ops::Wmma,
        DType::Float32,
        vec![x.clone(), x.clone(), x.clone()],
        descriptor,
    );
    assert_eq!(judge(&good), Verdict::Accept);

    let short = UOp::new(
        Ops::Wmma,
        DType::Float32,
        vec![x.clone(), x.clone(), x],
        Arg::ints([16, 16]),
    );
    assert_eq!(judge(&short), Verdict::Reject);
}

#[test]
fn contract_and_unroll_lane_products() {
    let axes = Arg::Tuple(vec![Arg::pair(Arg::Int(0), Arg::Int(2)), Arg::pair(Arg::Int(1), Arg::Int(2))]);

    let src = UOp::const_(DType::Float32, Arg::Float(0.0));
    let contract = UOp::new(Ops::Contract, DType::Float32.vec(4), vec![src], axes.clone());
    assert_eq!(judge(&contract), Verdict::Accept);

    let wrong_count = UOp::new(
        Ops::Contract,
        DType::Float32.vec(2),
        vec![UOp::const_(DType::Float32, Arg::Float(0.0))],
        axes.clone(),
    );
    assert_eq!(judge(&wrong_count), Verdict::Reject);

    let vec_src = UOp::new(Ops::Vectorize, DType::Float32.vec(4), vec![], Arg::None);
    let unroll = UOp::new(Ops::Unroll, DType::Float32, vec![vec_src], axes);
    assert_eq!(judge(&unroll), Verdict::Accept);
}

#[test]
fn if_endif_nesting() {
    let gate = UOp::const_(DType::Bool, Arg::Bool(true));
    let if_op = UOp::new(Ops::If, DType::Void, vec![gate.clone()], Arg::None);
    assert_eq!(judge(&if_op), Verdict::Accept);

    let barrier = UOp::new(Ops::Barrier, DType::Void, vec![], Arg::None);
    let with_barrier = UOp::new(Ops::If, DType::Void, vec![gate, barrier], Arg::None);
    assert_eq!(judge(&with_barrier), Verdict::Accept);

    let endif = UOp::new(Ops::EndIf, DType::Void, vec![if_op], Arg::None);
    assert_eq!(judge(&endif), Verdict::Accept);

    let dangling = UOp::new(Ops::EndIf, DType::Void, vec![UOp::iconst(0)], Arg::None);
    assert_eq!(judge(&dangling), Verdict::Abstain);
}

#[test]
fn reduce_axis_argument() {
    let src = UOp::const_(DType::Float32, Arg::Float(0.0));
    let good = UOp::new(
        Ops::ReduceAxis,
        DType::Float32,
        vec![src.clone()],
        Arg::Tuple(vec![Arg::Op(Ops::Add), Arg::Int(0)]),
    );
    assert_eq!(judge(&good), Verdict::Accept);

    let bad_op = UOp::new(
        Ops::ReduceAxis,
        DType::Float32,
        vec![src.clone()],
        Arg::Tuple(vec![Arg::Op(Ops::Sub), Arg::Int(0)]),
    );
    assert_eq!(judge(&bad_op), Verdict::Reject);

    let too_short = UOp::new(
        Ops::ReduceAxis,
        DType::Float32,
        vec![src],
        Arg::Tuple(vec![Arg::Op(Ops::Add)]),
    );
    assert_eq!(judge(&too_short), Verdict::Reject);
}

#[test]
fn gep_strips_lanes() {
    let vec4 = UOp::new(Ops::Vectorize, DType::Float32.vec(4), vec![], Arg::None);
    let good = UOp::new(Ops::Gep, DType::Float32, vec![vec4.clone()], Arg::ints([2]));
    assert_eq!(judge(&good), Verdict::Accept);

    let keeps_lanes = UOp::new(Ops::Gep, DType::Float32.vec(4), vec![vec4], Arg::ints([2]));
    assert_eq!(judge(&keeps_lanes), Verdict::Reject);
}

#[test]
fn vectorize_lane_count_equals_source_count() {
    let lane = || UOp::const_(DType::Float32, Arg::Float(1.0));
    let good = UOp::new(
        Ops::Vectorize,
        DType::Float32.vec(4),
        vec![lane(), lane(), lane(), lane()],
        Arg::None,
    );
    assert_eq!(judge(&good), Verdict::Accept);

    let count_mismatch = UOp::new(
        Ops::Vectorize,
        DType::Float32.vec(4),
        vec![lane(), lane()],
        Arg::None,
    );
    assert_eq!(judge(&count_mismatch), Verdict::Reject);

    let single = UOp::new(Ops::Vectorize, DType::Float32, vec![lane()], Arg::None);
    assert_eq!(judge(&single), Verdict::Reject);

    let base_mismatch = UOp::new(
        Ops::Vectorize,
        DType::Float32.vec(2),
        vec![lane(), UOp::const_(DType::Int32, Arg::Int(0))],
        Arg::None,
    );
    assert_eq!(judge(&base_mismatch), Verdict::Reject);
}

#[test]
fn casts_take_no_argument() {
    let x = UOp::const_(DType::Int32, Arg::Int(1));
    let cast = UOp::new(Ops::Cast, DType::Float32, vec![x.clone()], Arg::None);
    assert_eq!(judge(&cast), Verdict::Accept);

    let bitcast = UOp::new(Ops::Bitcast, DType::UInt32, vec![x.clone()], Arg::None);
    assert_eq!(judge(&bitcast), Verdict::Accept);

    let with_arg = UOp::new(Ops::Cast, DType::Float32, vec![x], Arg::Int(1));
    assert_eq!(judge(&with_arg), Verdict::Reject);
}

#[test]
fn barrier_fences_stores_or_stands_alone() {
    let buf = UOp::define_global(0, local_ptr(16));
    let idx = UOp::index(buf, UOp::loop_range(16, 0), None);
    let store = UOp::new(
        Ops::Store,
        DType::Void,
        vec![idx, UOp::const_(DType::Float32, Arg::Float(0.0))],
        Arg::None,
    );

    let fence = UOp::new(Ops::Barrier, DType::Void, vec![store], Arg::None);
    assert_eq!(judge(&fence), Verdict::Accept);

    let bare = UOp::new(Ops::Barrier, DType::Void, vec![], Arg::None);
    assert_eq!(judge(&bare), Verdict::Accept);

    let loop_tail = UOp::new(Ops::Barrier, DType::Void, vec![UOp::loop_range(4, 0)], Arg::None);
    assert_eq!(judge(&loop_tail), Verdict::Accept);

    let typed = UOp::new(Ops::Barrier, DType::Int32, vec![], Arg::None);
    assert_eq!(judge(&typed), Verdict::Abstain);
}

#[test]
fn sinks_and_escape_hatches_accept() {
    assert_eq!(judge(&UOp::sink([])), Verdict::Accept);
    assert_eq!(judge(&UOp::new(Ops::Noop, DType::Void, vec![], Arg::None)), Verdict::Accept);
    assert_eq!(
        judge(&UOp::new(Ops::Custom, DType::Void, vec![], Arg::Str("asm".into()))),
        Verdict::Accept
    );
    assert_eq!(
        judge(&UOp::new(Ops::CustomI, DType::Void, vec![], Arg::Str("asm".into()))),
        Verdict::Accept
    );
}
