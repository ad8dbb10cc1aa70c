//! Human-readable rendering for diagnostics.
//!
//! `render()` prints an index expression the way a kernel author would read
//! it; `dump_uops()` formats a whole node list the way the driver reports it
//! at high verbosity.

use std::sync::Arc;

use crate::op::Ops;
use crate::types::Arg;
use crate::uop::UOp;

impl UOp {
    /// Render this node as a compact infix expression.
    ///
    /// Used by the out-of-bounds diagnostic to show *which* offset expression
    /// escaped its buffer. Ops without a natural infix form fall back to
    /// `OP(arg)`.
    pub fn render(self: &Arc<Self>) -> String {
        match self.op() {
            Ops::Const => match self.arg() {
                Arg::Int(v) => v.to_string(),
                Arg::Float(v) => v.to_string(),
                Arg::Bool(v) => v.to_string(),
                other => format!("CONST({other:?})"),
            },
            Ops::Range => match self.arg() {
                Arg::Int(loop_id) => format!("ridx{loop_id}"),
                _ => "ridx?".to_string(),
            },
            Ops::Special => match self.arg().as_tuple() {
                Some([Arg::Str(name), ..]) => name.clone(),
                _ => "special?".to_string(),
            },
            Ops::DefineVar => match self.arg().as_tuple() {
                Some([Arg::Str(name), ..]) => name.clone(),
                _ => "var?".to_string(),
            },
            Ops::Add => self.render_infix("+"),
            Ops::Sub => self.render_infix("-"),
            Ops::Mul => self.render_infix("*"),
            Ops::Idiv => self.render_infix("//"),
            Ops::Mod => self.render_infix("%"),
            Ops::And => self.render_infix("&"),
            Ops::Or => self.render_infix("|"),
            Ops::Xor => self.render_infix("^"),
            Ops::Shl => self.render_infix("<<"),
            Ops::Shr => self.render_infix(">>"),
            Ops::Cmplt => self.render_infix("<"),
            Ops::Cmpne => self.render_infix("!="),
            Ops::Max => match self.src() {
                [a, b] => format!("max({}, {})", a.render(), b.render()),
                _ => "max(?)".to_string(),
            },
            Ops::Where => match self.src() {
                [c, t, f] => format!("({} ? {} : {})", c.render(), t.render(), f.render()),
                _ => "(?:?)".to_string(),
            },
            Ops::Cast | Ops::Bitcast => match self.src() {
                [x] => format!("({:?})({})", self.dtype(), x.render()),
                _ => format!("{}(?)", self.op()),
            },
            op => match self.arg() {
                Arg::None => op.to_string(),
                arg => format!("{op}({arg:?})"),
            },
        }
    }

    fn render_infix(self: &Arc<Self>, sym: &str) -> String {
        match self.src() {
            [a, b] => format!("({}{}{})", a.render(), sym, b.render()),
            _ => format!("{}(?)", self.op()),
        }
    }
}

/// Format a node list the way the verification driver reports it: position,
/// op, dtype, source positions and argument.
pub fn dump_uops(uops: &[Arc<UOp>]) -> String {
    use std::fmt::Write;

    let position = |id: u64| uops.iter().position(|u| u.id == id);
    let mut out = String::new();
    for (i, u) in uops.iter().enumerate() {
        let src: Vec<String> = u
            .src()
            .iter()
            .map(|s| position(s.id).map_or_else(|| "?".to_string(), |p| p.to_string()))
            .collect();
        let _ = writeln!(out, "{i:4} {:<18} {:<24} src={:?} arg={:?}", u.op().to_string(), format!("{:?}", u.dtype()), src, u.arg());
    }
    out
}
