//! Opcode table linking metadata to handlers.

use std::sync::OnceLock;

use super::opcode::{OpcodeKind, OpcodeMetadata};
use super::operand::OperandShape;
use crate::executor::handlers::{
    handle_binary, handle_check_member, handle_evict_let, handle_load_const, handle_load_let,
    handle_load_param, handle_not_member, handle_skip, handle_skip_if_false, handle_store_let,
    handle_tensor_sum, handle_tensor_sum_dim, handle_unary, Handler,
};

/// Metadata and handler for one opcode.
#[derive(Debug, Clone)]
pub(crate) struct OpcodeSpec {
    pub kind: OpcodeKind,
    pub metadata: OpcodeMetadata,
    pub handler: Handler,
}

/// The opcode table, indexed by `OpcodeKind as usize`.
///
/// # Panics
///
/// Panics on first use if the table order disagrees with [`OpcodeKind::ALL`].
pub(crate) fn opcode_specs() -> &'static [OpcodeSpec] {
    static SPECS: OnceLock<Vec<OpcodeSpec>> = OnceLock::new();
    SPECS.get_or_init(|| {
        let specs = build_specs();
        assert_eq!(specs.len(), OpcodeKind::ALL.len(), "opcode table is incomplete");
        for (index, (spec, kind)) in specs.iter().zip(OpcodeKind::ALL).enumerate() {
            assert!(
                spec.kind == kind && kind as usize == index,
                "opcode table entry {index} is {:?}, expected {kind:?}",
                spec.kind
            );
        }
        specs
    })
}

pub(crate) fn metadata_for(kind: OpcodeKind) -> &'static OpcodeMetadata {
    &opcode_specs()[kind as usize].metadata
}

pub(crate) fn handler_for(kind: OpcodeKind) -> Handler {
    opcode_specs()[kind as usize].handler
}

fn build_specs() -> Vec<OpcodeSpec> {
    use OpcodeKind::*;

    macro_rules! op {
        ($kind:ident, $name:literal, $shape:ident, $pops:literal => $pushes:literal, $handler:ident) => {
            op!($kind, $name, $shape, $pops => $pushes, false, $handler)
        };
        ($kind:ident, $name:literal, $shape:ident, $pops:literal => $pushes:literal, $jumps:literal, $handler:ident) => {
            OpcodeSpec {
                kind: $kind,
                metadata: OpcodeMetadata {
                    name: $name,
                    operand: OperandShape::$shape,
                    pops: $pops,
                    pushes: $pushes,
                    jumps: $jumps,
                },
                handler: $handler,
            }
        };
    }

    vec![
        op!(LoadConst, "load_const", Const, 0 => 1, handle_load_const),
        op!(LoadParam, "load_param", Param, 0 => 1, handle_load_param),
        op!(LoadLet, "load_let", Let, 0 => 1, handle_load_let),
        op!(Unary, "unary", Unary, 1 => 1, handle_unary),
        op!(Binary, "binary", Binary, 2 => 1, handle_binary),
        op!(Skip, "skip", Offset, 0 => 0, true, handle_skip),
        op!(SkipIfFalse, "skip_if_false", Offset, 1 => 0, true, handle_skip_if_false),
        op!(StoreLet, "store_let", None, 1 => 0, handle_store_let),
        op!(EvictLet, "evict_let", None, 0 => 0, handle_evict_let),
        op!(CheckMember, "check_member", Offset, 2 => 1, true, handle_check_member),
        op!(NotMember, "not_member", None, 1 => 1, handle_not_member),
        op!(TensorSum, "tensor_sum", None, 1 => 1, handle_tensor_sum),
        op!(TensorSumDim, "tensor_sum_dim", Dimension, 1 => 1, handle_tensor_sum_dim),
    ]
}
