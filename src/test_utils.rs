// SPDX-License-Identifier: Apache-2.0

//! Small netlists shared by unit tests, integration tests and the driver
//! tests.

/// Single two-input AND gate.
pub const AND2_BENCH: &str = "\
INPUT(A)
INPUT(B)
OUTPUT(z)
z = AND(A, B)
";

/// ISCAS-85 c17.
pub const C17_BENCH: &str = "\
# c17
# 5 inputs
# 2 outputs
# 6 NAND gates

INPUT(1)
INPUT(2)
INPUT(3)
INPUT(6)
INPUT(7)

OUTPUT(22)
OUTPUT(23)

10 = NAND(1, 3)
11 = NAND(3, 6)
16 = NAND(2, 11)
19 = NAND(11, 7)
22 = NAND(10, 16)
23 = NAND(16, 19)
";

/// `y = sel ? b : a`; vector order is `a b sel`.
pub const MUX_BENCH: &str = "\
INPUT(a)
INPUT(b)
INPUT(sel)
OUTPUT(y)
y = MUX(a, b, sel)
";

pub const DFF_BENCH: &str = "\
INPUT(d)
OUTPUT(q)
q = DFF(d)
";

/// One driver with two loads.
pub const FANOUT_BENCH: &str = "\
INPUT(a)
OUTPUT(x)
OUTPUT(y)
x = BUFF(a)
y = BUFF(a)
";

/// Combinational cycle with no register in it.
pub const COMB_LOOP_BENCH: &str = "\
INPUT(a)
OUTPUT(z)
x = AND(a, z)
z = OR(x, a)
";

/// Every `{0,1}` vector of `width` bits, counting up from all zeros.
pub fn exhaustive_vectors(width: usize) -> Vec<String> {
    (0..1u64 << width)
        .map(|n| format!("{:0width$b}", n, width = width))
        .collect()
}
